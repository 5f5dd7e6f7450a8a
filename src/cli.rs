use std::io::Write;

use anyhow::Result;
use clap::{App, Arg, SubCommand};
use log::{debug, info};

use crate::config::{ChannelEntry, Config};
use crate::dashboard::Dashboard;
use crate::normalize::filter_items;
use crate::source::ytdlp::YtDlpSource;
use crate::video::VideoItem;

/// Print configured channels
fn channels(cfg: &Config, out: &mut dyn Write) -> Result<()> {
    if cfg.channels.is_empty() {
        writeln!(out, "No channels configured.")?;
        return Ok(());
    }
    for c in &cfg.channels {
        writeln!(out, "{} - {} ({})", c.name, c.id, cfg.source_id(&c.id).kind.as_str())?;
    }
    Ok(())
}

fn write_video(out: &mut dyn Write, v: &VideoItem) -> Result<()> {
    let opt = |s: Option<String>| s.unwrap_or_else(|| "-".into());
    writeln!(
        out,
        "ID: {}\nTitle: {}\nChannel: {}\nPublished: {}\nDuration: {}\nThumbnail: {}\nURL: {}\nEmbed: {}\n----",
        v.video_id,
        v.title_str(),
        v.channel_name_str(),
        opt(v.published_str()),
        opt(v.duration_str()),
        opt(v.thumbnail.clone()),
        opt(v.url.clone()),
        opt(v.embed_url.clone()),
    )?;
    Ok(())
}

fn pick_channel<'a>(cfg: &'a Config, name: Option<&str>) -> Result<Option<&'a ChannelEntry>> {
    match name {
        Some(name) => Ok(Some(cfg.channel(name)?)),
        None => Ok(cfg.default_channel()),
    }
}

/// List videos for a channel
fn list(cfg: Config, name: Option<&str>, query: &str, out: &mut dyn Write) -> Result<()> {
    let entry = match pick_channel(&cfg, name)? {
        Some(e) => e.clone(),
        None => {
            writeln!(out, "No channels configured.")?;
            return Ok(());
        }
    };
    info!("Listing channel {:?}", &entry.name);

    let source = YtDlpSource::new(&cfg);
    let dash = Dashboard::new(cfg, Box::new(source));
    let videos = filter_items(dash.videos(&entry.id), query);
    if videos.is_empty() {
        writeln!(out, "No videos found.")?;
    }
    for v in &videos {
        write_video(out, v)?;
    }
    Ok(())
}

/// Show what the downloader would be pointed at
fn url(cfg: &Config, id: &str, out: &mut dyn Write) -> Result<()> {
    let sid = cfg.source_id(id);
    writeln!(out, "{} ({})", sid.url(), sid.kind.as_str())?;
    Ok(())
}

fn config_logging(verbosity: u64) -> Result<()> {
    // Level for this application
    let internal_level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,  // -v
        2 => log::LevelFilter::Debug, // -vv
        _ => log::LevelFilter::Trace, // -vvv
    };

    // Show log output for 3rd party library at -vvv
    let thirdparty_level = match verbosity {
        0..=2 => log::LevelFilter::Warn,
        _ => log::LevelFilter::Debug, // -vvv
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(thirdparty_level)
        .level_for("vidgrid", internal_level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}

pub fn main() -> Result<()> {
    // Web subcommand
    let sc_web = SubCommand::with_name("web").about("serve the dashboard");

    let sc_channels = SubCommand::with_name("channels").about("list configured channels");

    // List subcommand
    let sc_list = SubCommand::with_name("list")
        .about("list videos in a channel, newest first")
        .arg(Arg::with_name("channel").help("channel name (default: first configured)"))
        .arg(
            Arg::with_name("search")
                .short("s")
                .long("search")
                .takes_value(true)
                .help("only videos whose title or channel contains this"),
        );

    let sc_url = SubCommand::with_name("url")
        .about("show the listing URL for an identifier")
        .arg(Arg::with_name("id").required(true));

    // Main command
    let app = App::new("vidgrid")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(sc_web)
        .subcommand(sc_channels)
        .subcommand(sc_list)
        .subcommand(sc_url)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .takes_value(false)
                .global(true),
        );

    // Parse
    let app_m = app.get_matches();

    // Logging levels
    let verbosity = app_m.occurrences_of("verbose");
    config_logging(verbosity)?;

    debug!("Loading config");
    let cfg = Config::load()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match app_m.subcommand() {
        ("web", Some(_sub_m)) => crate::web::main(cfg)?,
        ("channels", Some(_sub_m)) => channels(&cfg, &mut out)?,
        ("list", Some(sub_m)) => list(
            cfg,
            sub_m.value_of("channel"),
            sub_m.value_of("search").unwrap_or(""),
            &mut out,
        )?,
        ("url", Some(sub_m)) => url(&cfg, sub_m.value_of("id").unwrap_or(""), &mut out)?,
        _ => {
            return Err(anyhow::anyhow!("Unhandled subcommand"));
        }
    };

    Ok(())
}
