//! Scene to SVG serialization.

use std::fmt::Write as _;

use crate::scene::{LABEL_FILL, SELECTION_STROKE, SHIMMER_STROKE, Scene, WATERMARK_FILL};

const LABEL_LINE_HEIGHT: f64 = 14.0;

/// Serializes a scene to a standalone SVG document. Output is deterministic:
/// the same scene always yields the same bytes.
pub fn render_svg(scene: &Scene) -> String {
    let mut out = String::new();
    let _ = write!(
        &mut out,
        r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"#,
        w = fmt(scene.width),
        h = fmt(scene.height),
    );

    let _ = write!(
        &mut out,
        r#"<text x="{x}" y="28" text-anchor="middle" font-size="26" font-weight="800">{title}</text>"#,
        x = fmt(scene.width / 2.0),
        title = escape_xml(&scene.title),
    );

    // Pan/zoom applies to the diagram body only; title and watermark stay
    // fixed to the canvas.
    let t = scene.transform;
    let _ = write!(
        &mut out,
        r#"<g transform="translate({x},{y}) scale({k})">"#,
        x = fmt(t.x),
        y = fmt(t.y),
        k = fmt(t.k),
    );

    out.push_str(r#"<g class="links" fill="none">"#);
    for l in &scene.links {
        let _ = write!(
            &mut out,
            r#"<path d="{d}" stroke="{stroke}" stroke-width="{sw}" stroke-opacity="{so}"/>"#,
            d = escape_xml(&l.path),
            stroke = escape_xml(&l.stroke),
            sw = fmt(l.stroke_width),
            so = fmt(l.stroke_opacity),
        );
        if scene.flow_animation {
            // The shimmer tracks the ribbon breadth, not the selection
            // emphasis.
            let base = l.stroke_width - if l.selected { 2.0 } else { 0.0 };
            let _ = write!(
                &mut out,
                r#"<path d="{d}" stroke="{SHIMMER_STROKE}" stroke-width="{sw}" stroke-opacity="0.18" class="link-shimmer" pointer-events="none"/>"#,
                d = escape_xml(&l.path),
                sw = fmt(base * 0.4),
            );
        }
    }
    out.push_str("</g>");

    out.push_str(r#"<g class="nodes">"#);
    for n in &scene.nodes {
        let _ = write!(
            &mut out,
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="{fill}" opacity="0.85" rx="3""#,
            x = fmt(n.x),
            y = fmt(n.y),
            w = fmt(n.width),
            h = fmt(n.height),
            fill = escape_xml(&n.fill),
        );
        if n.selected {
            let _ = write!(
                &mut out,
                r#" stroke="{SELECTION_STROKE}" stroke-width="3""#
            );
        }
        out.push_str("/>");

        let anchor = if n.label_anchor_end { "end" } else { "start" };
        let _ = write!(
            &mut out,
            r#"<text x="{x}" y="{y}" text-anchor="{anchor}" dominant-baseline="middle" font-size="12" font-weight="600" fill="{LABEL_FILL}">"#,
            x = fmt(n.label_x),
            y = fmt(n.label_y),
        );
        for (i, line) in n.label_lines.iter().enumerate() {
            let dy = if i == 0 { 0.0 } else { LABEL_LINE_HEIGHT };
            let _ = write!(
                &mut out,
                r#"<tspan x="{x}" dy="{dy}">{line}</tspan>"#,
                x = fmt(n.label_x),
                dy = fmt(dy),
                line = escape_xml(line),
            );
        }
        out.push_str("</text>");
    }
    out.push_str("</g>");

    out.push_str("</g>");

    let _ = write!(
        &mut out,
        r#"<text x="{x}" y="{y}" text-anchor="middle" font-size="11" fill="{WATERMARK_FILL}">{mark}</text>"#,
        x = fmt(scene.width / 2.0),
        y = fmt(scene.height - 10.0),
        mark = escape_xml(&scene.watermark),
    );

    out.push_str("</svg>");
    out
}

/// Shortest decimal form with at most three fractional digits.
pub(crate) fn fmt(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut s = format!("{v:.3}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" { "0".to_string() } else { s }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
