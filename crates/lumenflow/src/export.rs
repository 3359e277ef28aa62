//! Download-ready export of a rendered scene.
//!
//! SVG consumers outside a browser need a standalone document: a root
//! namespace declaration and an XML prolog. Both insertions are idempotent,
//! so markup can be normalized again without damage.

use std::sync::OnceLock;

use lumenflow_render::scene::Scene;
use regex::Regex;

pub const XML_PROLOG: &str = "<?xml version=\"1.0\" standalone=\"no\"?>\n";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Stem used when the chart title normalizes to nothing.
pub const FALLBACK_FILENAME: &str = "chart";

fn xmlns_present_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // An optional prolog, then the root tag; xmlns must appear among the
    // root tag's attributes, not merely anywhere in the document.
    RE.get_or_init(|| {
        Regex::new(r#"^(?:<\?xml[^>]*\?>\s*)?<svg[^>]*\sxmlns="#).expect("valid regex")
    })
}

fn whitespace_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Makes SVG markup standalone: declares the SVG namespace on the root
/// element when missing and prepends an XML prolog when absent. Applying the
/// function to its own output returns it unchanged.
pub fn normalize_svg_markup(svg: &str) -> String {
    let mut out = svg.to_string();

    if !xmlns_present_re().is_match(&out) {
        if let Some(pos) = out.find("<svg") {
            out.insert_str(pos + "<svg".len(), &format!(r#" xmlns="{SVG_NAMESPACE}""#));
        }
    }

    if !out.starts_with("<?xml") {
        out.insert_str(0, XML_PROLOG);
    }

    out
}

/// Derives a download filename from the chart title: runs of whitespace
/// collapse to single hyphens, an empty result falls back to
/// [`FALLBACK_FILENAME`], and the extension is appended only when the name
/// does not already end with it.
pub fn export_filename(title: &str, extension: &str) -> String {
    let stem = whitespace_run_re().replace_all(title.trim(), "-");
    let stem = if stem.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        stem.into_owned()
    };
    let suffix = format!(".{extension}");
    if stem.ends_with(&suffix) {
        stem
    } else {
        format!("{stem}{suffix}")
    }
}

/// Renders a scene and normalizes the markup for download in one step.
pub fn export_svg_sync(scene: &Scene) -> String {
    normalize_svg_markup(&lumenflow_render::render_svg(scene))
}

pub async fn export_svg(scene: &Scene) -> String {
    export_svg_sync(scene)
}
