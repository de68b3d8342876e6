//! Image activation, replacement, video swap and pan/zoom.

use crate::markers;
use crate::surface::decorate;
use sitecanvas_dom::{DomResult, ElementData, NodeId, Tree};

pub const VIDEO_PREFIX: &str = "video:";

pub const ZOOM_MIN: f64 = 1.0;
pub const ZOOM_MAX: f64 = 3.0;
pub const ZOOM_STEP: f64 = 0.25;

/// The image the user is choosing a replacement for.
///
/// One slot: a new activation replaces the previous target.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingImageTarget {
    pub key: String,
    pub width: f64,
    pub height: f64,
}

/// Focal point (percent of the frame) and zoom of an image in its frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageTransform {
    pub focal_x: f64,
    pub focal_y: f64,
    pub zoom: f64,
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self {
            focal_x: 50.0,
            focal_y: 50.0,
            zoom: 1.0,
        }
    }
}

impl ImageTransform {
    pub fn pan_to(&mut self, x_percent: f64, y_percent: f64) {
        self.focal_x = clamp_percent(x_percent);
        self.focal_y = clamp_percent(y_percent);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Write the transform onto the media element's inline style
    pub fn apply(&self, el: &mut ElementData) {
        if self.is_identity() {
            for prop in ["object-position", "transform", "transform-origin"] {
                el.remove_style(prop);
            }
            return;
        }
        let focal = format!("{}% {}%", self.focal_x, self.focal_y);
        el.set_style("object-position", &focal);
        el.set_style("transform", &format!("scale({})", self.zoom));
        el.set_style("transform-origin", &focal);
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 50.0;
    }
    value.clamp(0.0, 100.0)
}

/// Where a `video:` source should be played from
#[derive(Debug, Clone, PartialEq)]
pub enum VideoSource {
    Embed(String),
    File(String),
}

pub fn video_source(url: &str) -> VideoSource {
    let url = url.trim();
    let without_scheme = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");

    if let Some(rest) = without_scheme.strip_prefix("youtube.com/watch") {
        let id = rest
            .trim_start_matches('?')
            .split('&')
            .find_map(|pair| pair.strip_prefix("v="));
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            return VideoSource::Embed(format!("https://www.youtube.com/embed/{}", id));
        }
    }
    if let Some(id) = without_scheme.strip_prefix("youtu.be/") {
        let id = id.split(['?', '&', '/']).next().unwrap_or("");
        if !id.is_empty() {
            return VideoSource::Embed(format!("https://www.youtube.com/embed/{}", id));
        }
    }
    if let Some(rest) = without_scheme.strip_prefix("vimeo.com/") {
        let id = rest.split(['?', '/']).next().unwrap_or("");
        if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
            return VideoSource::Embed(format!("https://player.vimeo.com/video/{}", id));
        }
    }
    VideoSource::File(url.to_string())
}

/// Swap the media element for a video, keeping its key and presentation.
/// Returns the new node.
pub fn swap_to_video(tree: &mut Tree, id: NodeId, url: &str) -> DomResult<NodeId> {
    let old = tree
        .element(id)
        .cloned()
        .ok_or(sitecanvas_dom::DomError::NotAnElement(id))?;

    let mut el = match video_source(url) {
        VideoSource::Embed(src) => ElementData::new("iframe")
            .with_attr("src", src)
            .with_attr("frameborder", "0")
            .with_attr("allow", "autoplay; encrypted-media; picture-in-picture")
            .with_attr("allowfullscreen", ""),
        VideoSource::File(src) => ElementData::new("video")
            .with_attr("src", src)
            .with_attr("muted", "")
            .with_attr("autoplay", "")
            .with_attr("loop", "")
            .with_attr("playsinline", ""),
    };
    for name in ["class", "style", "width", "height", markers::KEY, markers::MANAGED, markers::DECORATED] {
        if let Some(value) = old.attr(name) {
            el.set_attr(name, value);
        }
    }
    if let Some(alt) = old.attr("alt").filter(|alt| !alt.is_empty()) {
        el.set_attr("title", alt);
    }

    let video = tree.create_element(el);
    tree.replace(id, video)?;
    if tree.attr(video, markers::DECORATED).is_some() {
        decorate::decorate_image(tree, video)?;
    }
    Ok(video)
}

pub fn is_media(tree: &Tree, id: NodeId) -> bool {
    matches!(tree.tag(id), Some("img" | "video" | "iframe"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecanvas_dom::parse_document;

    #[test]
    fn test_fifty_zoom_ins_clamp_at_three() {
        let mut t = ImageTransform::default();
        for _ in 0..50 {
            t.zoom_in();
        }
        assert_eq!(t.zoom, 3.0);
        for _ in 0..3 {
            t.zoom_out();
        }
        assert_eq!(t.zoom, 2.25);
    }

    #[test]
    fn test_pan_clamps() {
        let mut t = ImageTransform::default();
        t.pan_to(-40.0, 180.0);
        assert_eq!((t.focal_x, t.focal_y), (0.0, 100.0));
        t.reset();
        assert!(t.is_identity());
    }

    #[test]
    fn test_apply_writes_and_clears_styles() {
        let mut el = ElementData::new("img").with_attr("style", "width: 100%");
        let mut t = ImageTransform::default();
        t.zoom_in();
        t.pan_to(25.0, 75.0);
        t.apply(&mut el);
        assert_eq!(
            el.attr("style"),
            Some("width: 100%; object-position: 25% 75%; transform: scale(1.25); transform-origin: 25% 75%")
        );

        t.reset();
        t.apply(&mut el);
        assert_eq!(el.attr("style"), Some("width: 100%"));
    }

    #[test]
    fn test_video_sources() {
        assert_eq!(
            video_source("https://www.youtube.com/watch?v=abc123&t=4"),
            VideoSource::Embed("https://www.youtube.com/embed/abc123".to_string())
        );
        assert_eq!(
            video_source("https://youtu.be/xyz?si=1"),
            VideoSource::Embed("https://www.youtube.com/embed/xyz".to_string())
        );
        assert_eq!(
            video_source("https://vimeo.com/76979871"),
            VideoSource::Embed("https://player.vimeo.com/video/76979871".to_string())
        );
        assert_eq!(
            video_source("https://cdn.example.com/loop.mp4"),
            VideoSource::File("https://cdn.example.com/loop.mp4".to_string())
        );
    }

    #[test]
    fn test_swap_keeps_key() {
        let mut tree = parse_document(
            r#"<section><img src="/a.png" class="cover" data-sc-key="hero__inst_1" data-sc-managed="image"></section>"#,
        );
        let section = tree.children(tree.root())[0];
        let img = tree.children(section)[0];

        let video = swap_to_video(&mut tree, img, "https://cdn.example.com/loop.mp4").unwrap();

        assert!(!tree.is_alive(img));
        assert_eq!(tree.tag(video), Some("video"));
        assert_eq!(tree.attr(video, markers::KEY), Some("hero__inst_1"));
        assert_eq!(tree.attr(video, "class"), Some("cover"));
        assert_eq!(tree.children(section), &[video]);
    }
}
