use crate::Result;
use crate::model::{DrawableElem, FigureLayout, PathData, RectData, TextData};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

#[derive(Debug, Clone, Default)]
pub struct SvgRenderOptions {
    /// Root `<svg>` id; also prefixes marker ids and scopes the embedded CSS.
    pub figure_id: Option<String>,
}

#[derive(Debug, Clone)]
struct Node {
    tag: &'static str,
    attrs: BTreeMap<&'static str, String>,
    text: Option<String>,
    children: Vec<usize>,
}

fn node(tag: &'static str) -> Node {
    Node {
        tag,
        attrs: BTreeMap::new(),
        text: None,
        children: Vec::new(),
    }
}

fn push_child(arena: &mut Vec<Node>, parent: usize, child: Node) -> usize {
    let id = arena.len();
    arena.push(child);
    arena[parent].children.push(id);
    id
}

fn render_node(out: &mut String, arena: &[Node], id: usize) {
    let n = &arena[id];
    out.push('<');
    out.push_str(n.tag);
    for (k, v) in &n.attrs {
        let _ = write!(out, r#" {k}="{v}""#);
    }
    if n.children.is_empty() && n.text.as_deref().unwrap_or("").is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(t) = n.text.as_deref() {
        out.push_str(t);
    }
    for c in &n.children {
        render_node(out, arena, *c);
    }
    let _ = write!(out, "</{}>", n.tag);
}

/// Returns the `<g>` for a group path, creating missing levels under the root.
///
/// Groups are keyed by their full path, so `panel-0/x-axis/label` and `panel-1/x-axis/label`
/// stay distinct.
fn ensure_group(
    arena: &mut Vec<Node>,
    groups: &mut HashMap<String, usize>,
    group_texts: &[String],
) -> usize {
    let mut parent = 0usize;
    let mut key = String::new();
    for seg in group_texts {
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(seg);
        parent = match groups.get(&key) {
            Some(id) => *id,
            None => {
                let mut g = node("g");
                g.attrs.insert("class", escape_xml(seg));
                let id = push_child(arena, parent, g);
                groups.insert(key.clone(), id);
                id
            }
        };
    }
    parent
}

fn text_anchor(horizontal_pos: &str) -> &'static str {
    match horizontal_pos {
        "left" => "start",
        "right" => "end",
        _ => "middle",
    }
}

fn dominant_baseline(vertical_pos: &str) -> &'static str {
    match vertical_pos {
        "top" => "text-before-edge",
        "bottom" => "text-after-edge",
        _ => "middle",
    }
}

pub(crate) fn fmt(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    let s = v.to_string();
    if s == "-0" { "0".to_string() } else { s }
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn rect_node(r: &RectData) -> Node {
    let mut n = node("rect");
    n.attrs.insert("x", fmt(r.x));
    n.attrs.insert("y", fmt(r.y));
    n.attrs.insert("width", fmt(r.width));
    n.attrs.insert("height", fmt(r.height));
    n.attrs.insert("fill", escape_xml(&r.fill));
    n.attrs.insert("stroke", escape_xml(&r.stroke_fill));
    n.attrs.insert("stroke-width", fmt(r.stroke_width));
    n
}

fn text_node(t: &TextData) -> Node {
    let mut n = node("text");
    n.attrs.insert("fill", escape_xml(&t.fill));
    n.attrs.insert("font-size", fmt(t.font_size));
    n.attrs
        .insert("dominant-baseline", dominant_baseline(&t.vertical_pos).to_string());
    n.attrs
        .insert("text-anchor", text_anchor(&t.horizontal_pos).to_string());
    if t.rotation == 0.0 {
        n.attrs.insert("x", fmt(t.x));
        n.attrs.insert("y", fmt(t.y));
    } else {
        n.attrs.insert("x", "0".to_string());
        n.attrs.insert("y", "0".to_string());
        n.attrs.insert(
            "transform",
            format!(
                "translate({}, {}) rotate({})",
                fmt(t.x),
                fmt(t.y),
                fmt(t.rotation)
            ),
        );
    }
    n.text = Some(escape_xml(&t.text));
    n
}

fn path_node(p: &PathData, marker_id: Option<&str>) -> Node {
    let mut n = node("path");
    n.attrs.insert("d", escape_xml(&p.path));
    n.attrs
        .insert("fill", escape_xml(p.fill.as_deref().unwrap_or("none")));
    n.attrs.insert("stroke", escape_xml(&p.stroke_fill));
    n.attrs.insert("stroke-width", fmt(p.stroke_width));
    if let Some(dash) = p.line_style.dash_array(p.stroke_width) {
        n.attrs.insert("stroke-dasharray", dash);
    }
    if let Some(id) = marker_id {
        n.attrs.insert("marker-end", format!("url(#{})", escape_xml(id)));
    }
    n
}

/// One arrow-head marker per distinct stroke color, in first-use order.
fn arrow_markers(layout: &FigureLayout, figure_id: &str) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for elem in &layout.drawables {
        let DrawableElem::Path { data, .. } = elem else {
            continue;
        };
        for p in data.iter().filter(|p| p.arrow_end) {
            if out.iter().all(|(color, _)| color != &p.stroke_fill) {
                let id = format!("{figure_id}-arrowhead-{}", out.len());
                out.push((p.stroke_fill.clone(), id));
            }
        }
    }
    out
}

fn figure_css(figure_id: &str, font_family: &str) -> String {
    let id = escape_xml(figure_id);
    let font = escape_xml(font_family);
    format!(
        "#{id}{{font-family:{font};}}#{id} text{{font-family:{font};}}#{id} path{{stroke-linecap:butt;stroke-linejoin:round;}}"
    )
}

/// Serializes a computed figure layout into a standalone SVG document.
pub fn render_figure_svg(layout: &FigureLayout, options: &SvgRenderOptions) -> Result<String> {
    if !(layout.width > 0.0 && layout.height > 0.0) {
        return Err(crate::Error::InvalidLayout {
            message: format!(
                "figure has a degenerate size ({}x{})",
                fmt(layout.width),
                fmt(layout.height)
            ),
        });
    }

    let figure_id = options.figure_id.as_deref().unwrap_or("synthviz");
    let figure_id_esc = escape_xml(figure_id);
    let w = fmt(layout.width);
    let h = fmt(layout.height);

    let mut out = String::new();
    let _ = write!(
        &mut out,
        r#"<svg id="{figure_id_esc}" width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" role="graphics-document document" aria-roledescription="synthetic-control">"#,
    );
    let _ = write!(
        &mut out,
        "<style>{}</style>",
        figure_css(figure_id, &layout.font_family)
    );

    let markers = arrow_markers(layout, figure_id);
    if !markers.is_empty() {
        out.push_str("<defs>");
        for (color, id) in &markers {
            let _ = write!(
                &mut out,
                r#"<marker id="{}" viewBox="0 0 10 10" refX="9" refY="5" markerUnits="userSpaceOnUse" markerWidth="10" markerHeight="10" orient="auto"><path d="M0,0L10,5L0,10z" fill="{}"/></marker>"#,
                escape_xml(id),
                escape_xml(color)
            );
        }
        out.push_str("</defs>");
    }

    let mut arena: Vec<Node> = Vec::new();
    let mut root = node("g");
    root.attrs.insert("class", "main".to_string());
    arena.push(root);

    let mut bg = node("rect");
    bg.attrs.insert("width", w.clone());
    bg.attrs.insert("height", h.clone());
    bg.attrs.insert("class", "background".to_string());
    bg.attrs.insert("fill", escape_xml(&layout.background_color));
    push_child(&mut arena, 0, bg);

    let mut groups: HashMap<String, usize> = HashMap::new();
    for elem in &layout.drawables {
        match elem {
            DrawableElem::Rect { group_texts, data } => {
                if data.is_empty() {
                    continue;
                }
                let parent = ensure_group(&mut arena, &mut groups, group_texts);
                for r in data {
                    push_child(&mut arena, parent, rect_node(r));
                }
            }
            DrawableElem::Text { group_texts, data } => {
                if data.is_empty() {
                    continue;
                }
                let parent = ensure_group(&mut arena, &mut groups, group_texts);
                for t in data {
                    push_child(&mut arena, parent, text_node(t));
                }
            }
            DrawableElem::Path { group_texts, data } => {
                if data.is_empty() {
                    continue;
                }
                let parent = ensure_group(&mut arena, &mut groups, group_texts);
                for p in data {
                    let marker = p
                        .arrow_end
                        .then(|| {
                            markers
                                .iter()
                                .find(|(color, _)| color == &p.stroke_fill)
                                .map(|(_, id)| id.as_str())
                        })
                        .flatten();
                    push_child(&mut arena, parent, path_node(p, marker));
                }
            }
        }
    }

    render_node(&mut out, &arena, 0);
    out.push_str("</svg>\n");

    tracing::debug!(
        figure_id,
        bytes = out.len(),
        groups = groups.len(),
        "rendered figure svg"
    );
    Ok(out)
}
