use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};

use crate::cache::TtlCache;
use crate::config::Config;
use crate::normalize::normalize;
use crate::source::base::{FetchError, RawRecord, VideoSource};
use crate::video::VideoItem;

type Listings = TtlCache<String, Arc<Vec<RawRecord>>>;

/// Fetch, cache and normalize listings for the configured channels
pub struct Dashboard {
    pub config: Config,
    source: Box<dyn VideoSource>,
    cache: Mutex<Listings>,
}

impl Dashboard {
    pub fn new(config: Config, source: Box<dyn VideoSource>) -> Dashboard {
        let cache = Mutex::new(TtlCache::new(config.cache_ttl()));
        Dashboard {
            config,
            source,
            cache,
        }
    }

    fn lock_cache(&self) -> MutexGuard<'_, Listings> {
        match self.cache.lock() {
            Ok(c) => c,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Cached records for `id`, or fetch them. The cache is not locked while
    /// the downloader runs.
    fn records(&self, id: &str) -> Result<Arc<Vec<RawRecord>>, FetchError> {
        let now = chrono::Utc::now();
        let key = id.to_string();
        {
            let mut cache = self.lock_cache();
            cache.purge_stale(now);
            if let Some(records) = cache.get(&key, now) {
                return Ok(records.clone());
            }
        }

        let sid = self.config.source_id(id);
        info!("Fetching {} listing {:?}", sid.kind.as_str(), sid.id_str());
        let records = Arc::new(self.source.fetch(&sid)?);
        self.lock_cache().insert(key, records.clone(), now);
        Ok(records)
    }

    /// Normalized videos for `id`, newest first. Fetch problems are logged and
    /// give an empty list.
    pub fn videos(&self, id: &str) -> Vec<VideoItem> {
        let id = id.trim();
        if id.is_empty() {
            return vec![];
        }
        match self.records(id) {
            Ok(records) => {
                debug!("{} raw records for {:?}", records.len(), id);
                normalize(records.iter())
            }
            Err(e) => {
                warn!("Failed to fetch {:?}: {:?}", id, anyhow::Error::from(e));
                vec![]
            }
        }
    }

    /// Forget the cached listing so the next request fetches again
    pub fn refresh(&self, id: &str) {
        self.lock_cache().invalidate(&id.trim().to_string());
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    use crate::common::SourceID;

    /// Serves canned records and counts how often it was asked
    pub(crate) struct FakeSource {
        pub records: Vec<RawRecord>,
        pub fail: bool,
        pub calls: Arc<AtomicUsize>,
    }

    impl FakeSource {
        pub(crate) fn new(records: Vec<RawRecord>) -> FakeSource {
            FakeSource {
                records,
                fail: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl VideoSource for FakeSource {
        fn fetch(&self, _id: &SourceID) -> Result<Vec<RawRecord>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Spawn {
                    program: "yt-dlp".into(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                });
            }
            Ok(self.records.clone())
        }
    }

    pub(crate) fn record(id: &str, title: &str, date: &str) -> RawRecord {
        RawRecord {
            id: Some(id.into()),
            title: Some(title.into()),
            upload_date: Some(date.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_videos_cached() {
        let src = FakeSource::new(vec![
            record("old", "Old", "20200101"),
            record("new", "New", "20240101"),
        ]);
        let calls = src.calls.clone();
        let dash = Dashboard::new(Config::default(), Box::new(src));

        let first = dash.videos("UCabc");
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].video_id, "new");

        let second = dash.videos(" UCabc ");
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        dash.refresh("UCabc");
        dash.videos("UCabc");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        dash.videos("PLother");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_fetch_failure_degrades_to_empty() {
        let mut src = FakeSource::new(vec![record("a", "A", "20200101")]);
        src.fail = true;
        let calls = src.calls.clone();
        let dash = Dashboard::new(Config::default(), Box::new(src));

        assert!(dash.videos("UCabc").is_empty());
        // Failures aren't cached
        assert!(dash.videos("UCabc").is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_blank_id_skips_fetch() {
        let src = FakeSource::new(vec![record("a", "A", "20200101")]);
        let calls = src.calls.clone();
        let dash = Dashboard::new(Config::default(), Box::new(src));
        assert!(dash.videos("  ").is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_ttl_always_fetches() {
        let src = FakeSource::new(vec![]);
        let calls = src.calls.clone();
        let mut cfg = Config::default();
        cfg.cache_ttl_secs = 0;
        let dash = Dashboard::new(cfg, Box::new(src));
        dash.videos("UCabc");
        dash.videos("UCabc");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_huge_ttl_caches() {
        let src = FakeSource::new(vec![record("a", "A", "20200101")]);
        let calls = src.calls.clone();
        let mut cfg = Config::default();
        cfg.cache_ttl_secs = i64::MAX;
        let dash = Dashboard::new(cfg, Box::new(src));
        assert_eq!(dash.videos("UCabc").len(), 1);
        assert_eq!(dash.videos("UCabc").len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Takes a while to list `UCslow`, answers everything else at once
    struct SlowSource;

    impl VideoSource for SlowSource {
        fn fetch(&self, id: &SourceID) -> Result<Vec<RawRecord>, FetchError> {
            if id.id_str() == "UCslow" {
                thread::sleep(Duration::from_millis(1500));
            }
            Ok(vec![record(id.id_str(), "Talk", "20240101")])
        }
    }

    #[test]
    fn test_slow_fetch_does_not_block_other_listings() {
        let dash = Arc::new(Dashboard::new(Config::default(), Box::new(SlowSource)));

        let slow = {
            let dash = dash.clone();
            thread::spawn(move || dash.videos("UCslow"))
        };
        thread::sleep(Duration::from_millis(100));

        let start = Instant::now();
        let fast = dash.videos("UCfast");
        assert!(start.elapsed() < Duration::from_millis(500), "waited {:?}", start.elapsed());
        assert_eq!(fast.len(), 1);

        // Cached now, and still answering while the slow fetch runs
        let start = Instant::now();
        assert_eq!(dash.videos("UCfast").len(), 1);
        assert!(start.elapsed() < Duration::from_millis(500));

        assert_eq!(slow.join().unwrap()[0].video_id, "UCslow");
    }
}
