use petgraph::dot::{Config, Dot};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::graph::LabelGraph;
use crate::layout::{Layout, Position};

#[derive(Debug, Clone)]
pub struct SvgStyle {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub node_radius: f64,
    pub labels: bool,
}

impl Default for SvgStyle {
    fn default() -> Self {
        SvgStyle {
            width: 800.0,
            height: 600.0,
            margin: 40.0,
            node_radius: 8.0,
            labels: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct PositionRecord<'a> {
    name: &'a str,
    x: f64,
    y: f64,
}

/// Headerless `name,x,y` rows in node order.
pub fn write_positions(path: impl AsRef<Path>, graph: &LabelGraph, layout: &Layout) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;

    for node in graph.inner().node_indices() {
        let Position { x, y } = layout[node];
        writer.serialize(PositionRecord {
            name: graph.label(node),
            x,
            y,
        })?;
    }
    writer.flush()?;

    info!("Wrote positions to {}", path.as_ref().display());
    Ok(())
}

pub fn dot_string(graph: &LabelGraph, layout: &Layout) -> String {
    format!(
        "{:?}",
        Dot::with_attr_getters(
            graph.inner(),
            &[Config::EdgeNoLabel, Config::NodeNoLabel],
            &|_, _| String::new(),
            &|_, (node, label)| {
                let Position { x, y } = layout[node];
                format!("label=\"{}\" pos=\"{},{}!\"", escape_dot(label), x, y)
            },
        )
    )
}

pub fn write_dot(path: impl AsRef<Path>, graph: &LabelGraph, layout: &Layout) -> Result<()> {
    std::fs::write(path.as_ref(), dot_string(graph, layout))?;
    info!("Wrote graphviz file to {}", path.as_ref().display());
    Ok(())
}

fn escape_dot(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

// Maps layout coordinates into the drawable part of the canvas.
struct Viewport {
    min: Position,
    scale: f64,
    offset: Position,
}

impl Viewport {
    fn fit(layout: &Layout, style: &SvgStyle) -> Self {
        let inner_w = (style.width - 2.0 * style.margin).max(1.0);
        let inner_h = (style.height - 2.0 * style.margin).max(1.0);

        let Some((min, max)) = layout.bounds() else {
            return Viewport {
                min: Position::default(),
                scale: 1.0,
                offset: Position::new(style.margin, style.margin),
            };
        };

        let span_x = max.x - min.x;
        let span_y = max.y - min.y;
        let scale = match (span_x > 0.0, span_y > 0.0) {
            (true, true) => (inner_w / span_x).min(inner_h / span_y),
            (true, false) => inner_w / span_x,
            (false, true) => inner_h / span_y,
            (false, false) => 1.0,
        };

        // center the drawing in whichever direction has room left
        let offset = Position::new(
            style.margin + (inner_w - span_x * scale) / 2.0,
            style.margin + (inner_h - span_y * scale) / 2.0,
        );
        Viewport { min, scale, offset }
    }

    fn project(&self, p: Position) -> Position {
        Position::new(
            self.offset.x + (p.x - self.min.x) * self.scale,
            self.offset.y + (p.y - self.min.y) * self.scale,
        )
    }
}

pub fn svg_string(graph: &LabelGraph, layout: &Layout, style: &SvgStyle) -> String {
    let view = Viewport::fit(layout, style);
    let r = style.node_radius;
    let mut svg = String::new();

    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = style.width,
        h = style.height
    );
    let _ = writeln!(
        svg,
        r##"<defs><marker id="arrow" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="6" markerHeight="6" orient="auto-start-reverse"><path d="M 0 0 L 10 5 L 0 10 z" fill="#555"/></marker></defs>"##
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

    let _ = writeln!(svg, r##"<g stroke="#555" stroke-width="1.2">"##);
    for edge in graph.inner().edge_references() {
        let a = view.project(layout[edge.source()]);
        let b = view.project(layout[edge.target()]);
        if edge.source() == edge.target() {
            let _ = writeln!(
                svg,
                r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="none"/>"#,
                a.x,
                a.y - r * 1.5,
                r
            );
            continue;
        }
        // stop the line at the rim of the target circle so the arrow shows
        let length = a.distance(&b).max(f64::EPSILON);
        let end = Position::new(b.x - (b.x - a.x) * r / length, b.y - (b.y - a.y) * r / length);
        let _ = writeln!(
            svg,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" marker-end="url(#arrow)"/>"#,
            a.x, a.y, end.x, end.y
        );
    }
    let _ = writeln!(svg, "</g>");

    let _ = writeln!(svg, r##"<g fill="#1f78b4" stroke="#0b3c5d">"##);
    for node in graph.inner().node_indices() {
        let p = view.project(layout[node]);
        let _ = writeln!(svg, r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}"/>"#, p.x, p.y, r);
    }
    let _ = writeln!(svg, "</g>");

    if style.labels {
        let _ = writeln!(svg, r#"<g font-family="sans-serif" font-size="12" fill="black">"#);
        for node in graph.inner().node_indices() {
            let p = view.project(layout[node]);
            let _ = writeln!(
                svg,
                r#"<text x="{:.2}" y="{:.2}">{}</text>"#,
                p.x + r + 2.0,
                p.y - r,
                escape_xml(graph.label(node))
            );
        }
        let _ = writeln!(svg, "</g>");
    }

    svg.push_str("</svg>\n");
    svg
}

pub fn write_svg(
    path: impl AsRef<Path>,
    graph: &LabelGraph,
    layout: &Layout,
    style: &SvgStyle,
) -> Result<()> {
    std::fs::write(path.as_ref(), svg_string(graph, layout, style))?;
    info!("Wrote drawing to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge_list::parse_edges;
    use crate::layout::{layered_layout, spring_layout, SpringConfig};
    use std::io::Cursor;

    fn graph(text: &str) -> LabelGraph {
        LabelGraph::from_edges(&parse_edges(Cursor::new(text)).unwrap())
    }

    #[test]
    fn test_write_positions() {
        let g = graph("P0,P1\nP1,P2\nP0,P3\n");
        let layout = layered_layout(&g).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_positions(&path, &g, &layout).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "P0,0.0,0.0\nP1,1.0,0.0\nP2,2.0,0.0\nP3,1.0,1.0\n");
    }

    #[test]
    fn test_dot_string() {
        let g = graph("a,b\n\"q\",b\n");
        let layout = layered_layout(&g).unwrap();
        let dot = dot_string(&g, &layout);

        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains(r#"label="a" pos="0,0!""#));
        assert!(dot.contains(r#"label="\"q\"""#));
        assert!(dot.contains("0 -> 1"));
        assert!(dot.contains("2 -> 1"));
    }

    #[test]
    fn test_svg_string() {
        let g = graph("n1,n2\nn2,n3\nn3,n1\nn3,<n4>\nn4,n4\n");
        let layout = spring_layout(&g, &SpringConfig::default());
        let svg = svg_string(&g, &layout, &SvgStyle::default());

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<line ").count(), 4);
        assert_eq!(svg.matches("<text ").count(), 5);
        assert!(svg.contains("&lt;n4&gt;"));
    }

    #[test]
    fn test_svg_stays_inside_canvas() {
        let g = graph("a,b\nb,c\nc,d\nd,a\na,c\n");
        let layout = spring_layout(&g, &SpringConfig::default());
        let style = SvgStyle::default();
        let view = Viewport::fit(&layout, &style);

        for p in layout.positions() {
            let q = view.project(*p);
            assert!(q.x >= style.margin - 1e-9 && q.x <= style.width - style.margin + 1e-9);
            assert!(q.y >= style.margin - 1e-9 && q.y <= style.height - style.margin + 1e-9);
        }
    }

    #[test]
    fn test_svg_empty_graph() {
        let svg = svg_string(&LabelGraph::new(), &Layout::default(), &SvgStyle::default());
        assert!(!svg.contains("<circle"));
    }
}
