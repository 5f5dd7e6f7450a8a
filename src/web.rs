use std::sync::Arc;

use anyhow::{Context, Result};
use askama::Template;
use log::{debug, error, info};
use rouille::{router, Request, Response};

use crate::config::{ChannelEntry, Config, ConfigError};
use crate::dashboard::Dashboard;
use crate::normalize::filter_items;
use crate::selection::Selection;
use crate::source::ytdlp::YtDlpSource;
use crate::video::VideoItem;

/// Page state carried in the query string
#[derive(Debug, Clone, Default, PartialEq)]
struct PageParams {
    channel: Option<String>,
    query: String,
    video: Option<String>,
    focus: bool,
}

impl PageParams {
    fn from_request(request: &Request) -> PageParams {
        PageParams {
            channel: request.get_param("channel").filter(|c| !c.is_empty()),
            query: request.get_param("q").unwrap_or_default(),
            video: request.get_param("video").filter(|v| !v.is_empty()),
            focus: request.get_param("focus").as_deref() == Some("1"),
        }
    }

    fn href(&self) -> String {
        let mut parts: Vec<String> = vec![];
        if let Some(c) = &self.channel {
            parts.push(format!("channel={}", urlencoding::encode(c)));
        }
        if !self.query.is_empty() {
            parts.push(format!("q={}", urlencoding::encode(&self.query)));
        }
        if let Some(v) = &self.video {
            parts.push(format!("video={}", urlencoding::encode(v)));
        }
        if self.focus {
            parts.push("focus=1".into());
        }
        if parts.is_empty() {
            "/".into()
        } else {
            format!("/?{}", parts.join("&"))
        }
    }

    fn with_video(&self, video_id: Option<&str>) -> PageParams {
        PageParams {
            video: video_id.map(String::from),
            ..self.clone()
        }
    }

    fn with_focus(&self, focus: bool) -> PageParams {
        PageParams {
            focus,
            ..self.clone()
        }
    }

    /// Switching channel starts from a clean grid
    fn for_channel(&self, name: &str) -> PageParams {
        PageParams {
            channel: Some(name.into()),
            focus: self.focus,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
struct WebChannel {
    name: String,
    href: String,
    active: bool,
}

#[derive(Debug)]
struct WebVideo {
    video_id: String,
    title: String,
    channel_name: String,
    thumbnail: Option<String>,
    embed_url: Option<String>,
    watch_url: Option<String>,
    published: Option<String>,
    duration: Option<String>,
    play_href: String,
    playing: bool,
}

impl WebVideo {
    fn new(v: &VideoItem, params: &PageParams, selection: &Selection) -> WebVideo {
        WebVideo {
            video_id: v.video_id.clone(),
            title: v.title_str().into(),
            channel_name: v.channel_name_str().into(),
            thumbnail: v.thumbnail.clone(),
            embed_url: v.embed_url.clone(),
            watch_url: v.url.clone(),
            published: v.published_str(),
            duration: v.duration_str(),
            play_href: params.with_video(Some(&v.video_id)).href(),
            playing: selection.is_selected(&v.video_id) && v.embed_url.is_some(),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    channels: Vec<WebChannel>,
    channel: String,
    query: String,
    focus: bool,
    focus_href: String,
    refresh_href: String,
    exit_focus_href: String,
    focused: Option<WebVideo>,
    videos: Vec<WebVideo>,
}

/// Channel a request refers to, defaulting to the first configured one
fn pick_channel<'a>(cfg: &'a Config, params: &PageParams) -> Result<Option<&'a ChannelEntry>> {
    match &params.channel {
        Some(name) => Ok(Some(cfg.channel(name)?)),
        None => Ok(cfg.default_channel()),
    }
}

/// Filtered listing plus the reconciled selection for one request
fn current_videos(dash: &Dashboard, entry: &ChannelEntry, params: &PageParams) -> (Vec<VideoItem>, Selection) {
    let videos = filter_items(dash.videos(&entry.id), &params.query);
    let mut selection = Selection::new(None, params.focus);
    if let Some(id) = &params.video {
        selection.select(id);
    }
    selection.retain_visible(&videos);
    (videos, selection)
}

fn render_dashboard(dash: &Dashboard, params: PageParams) -> Result<String> {
    let cfg = &dash.config;
    let entry = pick_channel(cfg, &params)?;
    let mut params = params;
    if let Some(e) = entry {
        params.channel = Some(e.name.clone());
    }

    let (videos, mut selection) = match entry {
        Some(e) => current_videos(dash, e, &params),
        None => (vec![], Selection::default()),
    };

    let focused = selection.focused(&videos).map(|v| WebVideo::new(v, &params, &selection));
    if selection.is_focus() && focused.is_none() {
        // Nothing playable to focus on
        selection.clear();
    }
    params.video = selection.selected_id().map(String::from);

    let channels = cfg
        .channels
        .iter()
        .map(|c| WebChannel {
            name: c.name.clone(),
            href: params.for_channel(&c.name).href(),
            active: params.channel.as_deref() == Some(c.name.as_str()),
        })
        .collect();

    let web_videos = if focused.is_some() {
        vec![]
    } else {
        videos.iter().map(|v| WebVideo::new(v, &params, &selection)).collect()
    };

    let mut leaving = selection.clone();
    leaving.exit_focus();
    let exit_focus_href = params.with_video(leaving.selected_id()).href();

    let refresh_href = match &params.channel {
        Some(c) => format!("/refresh?channel={}", urlencoding::encode(c)),
        None => "/refresh".into(),
    };

    let t = DashboardTemplate {
        channels,
        channel: params.channel.clone().unwrap_or_default(),
        query: params.query.clone(),
        focus: params.focus,
        focus_href: params.with_focus(!params.focus).href(),
        refresh_href,
        exit_focus_href,
        focused,
        videos: web_videos,
    };
    let html = t.render()?;
    Ok(html)
}

fn page_dashboard(dash: &Dashboard, request: &Request) -> Result<Response> {
    let params = PageParams::from_request(request);
    debug!("Dashboard request {:?}", params);
    let html = render_dashboard(dash, params)?;
    Ok(Response::html(html))
}

fn page_videos_json(dash: &Dashboard, request: &Request) -> Result<Response> {
    let params = PageParams::from_request(request);
    let videos = match pick_channel(&dash.config, &params)? {
        Some(e) => filter_items(dash.videos(&e.id), &params.query),
        None => vec![],
    };
    Ok(Response::json(&videos))
}

fn page_refresh(dash: &Dashboard, request: &Request) -> Result<Response> {
    let params = PageParams::from_request(request);
    if let Some(e) = pick_channel(&dash.config, &params)? {
        info!("Refreshing listing for {:?}", &e.name);
        dash.refresh(&e.id);
    }
    let back = PageParams {
        channel: params.channel,
        ..Default::default()
    };
    Ok(Response::redirect_303(back.href()))
}

fn handle_response(request: &Request, dash: &Dashboard) -> Response {
    if let Some(request) = request.remove_prefix("/static") {
        return match request.url().as_str() {
            "/style.css" => Response::from_data("text/css", include_str!("../static/style.css")),
            _ => Response::text("404").with_status_code(404),
        };
    }

    let resp: Result<Response> = router!(request,
        (GET) ["/"] => {
            page_dashboard(dash, request)
        },
        (GET) ["/videos.json"] => {
            page_videos_json(dash, request)
        },
        (POST) ["/refresh"] => {
            page_refresh(dash, request)
        },
        // Default route
        _ => {
            Ok(Response::text("404 Not found").with_status_code(404))
        }
    );
    match resp {
        Ok(r) => r,
        Err(e) => error_response(&e),
    }
}

fn error_response(e: &anyhow::Error) -> Response {
    match e.downcast_ref::<ConfigError>() {
        Some(ConfigError::UnknownChannel(_)) => Response::text(format!("{}", e)).with_status_code(404),
        _ => {
            error!("Request failed: {:?}", e);
            Response::text("Internal service error").with_status_code(500)
        }
    }
}

fn serve(dash: Arc<Dashboard>) -> Result<()> {
    let addr = format!("{}:{}", dash.config.web_host, dash.config.web_port);
    info!("Listening on http://{}", &addr);
    let srv = rouille::Server::new(&addr, move |request| handle_response(request, &dash))
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("Failed to listen on {}", addr))?;
    srv.run();
    Ok(())
}

pub fn main(cfg: Config) -> Result<()> {
    let source = YtDlpSource::new(&cfg);
    let dash = Arc::new(Dashboard::new(cfg, Box::new(source)));
    serve(dash)
}
