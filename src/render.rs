use std::collections::{HashMap, HashSet};
use std::fmt::Write as FmtWrite;

use crate::utils::{escape_xml, wrap_label};
use crate::*;

const EDGE_STROKE: &str = "#64748b";
const NODE_FILL: &str = "#eef2ff";
const NODE_STROKE: &str = "#4f46e5";
const TEXT_COLOR: &str = "#1e293b";
const LABEL_FONT_SIZE: f32 = 14.0;
const LABEL_LINE_HEIGHT: f32 = 17.0;
const EDGE_LABEL_FONT_SIZE: f32 = 12.0;
const MAX_LABEL_LINES: usize = 3;
const TEXT_INSET: f32 = 16.0;

/// Later payload entries win, matching the layout's own lookup.
fn node_lookup(nodes: &[Node]) -> HashMap<&str, &Node> {
    nodes.iter().map(|node| (node.id.as_str(), node)).collect()
}

fn write_header(svg: &mut String, view_box: ViewBox, background: &str) -> Result<()> {
    write!(
        svg,
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="{:.0} {:.0} {:.0} {:.0}" font-family="Inter, system-ui, sans-serif">
  <defs>
    <marker id="concept-arrow" markerWidth="8" markerHeight="8" refX="6" refY="4" orient="auto" markerUnits="strokeWidth">
      <path d="M1,1 L6,4 L1,7 z" fill="context-stroke" />
    </marker>
  </defs>
  <rect x="{:.0}" y="{:.0}" width="{:.0}" height="{:.0}" fill="{}" />
"##,
        view_box.width,
        view_box.height,
        view_box.min_x,
        view_box.min_y,
        view_box.width,
        view_box.height,
        view_box.min_x,
        view_box.min_y,
        view_box.width,
        view_box.height,
        escape_xml(background)
    )?;
    Ok(())
}

fn write_curve(svg: &mut String, curve: &EdgeCurve, stroke: &str) -> Result<()> {
    writeln!(
        svg,
        "  <path class=\"concept-edge\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\" marker-end=\"url(#concept-arrow)\" />",
        curve.path.to_path_data(),
        escape_xml(stroke)
    )?;

    let label = curve.label.trim();
    if label.is_empty() {
        return Ok(());
    }
    let mid = curve.path.midpoint();
    // White halo keeps the label readable over crossing curves.
    writeln!(
        svg,
        "  <text x=\"{:.1}\" y=\"{:.1}\" fill=\"{}\" font-size=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\" paint-order=\"stroke\" stroke=\"white\" stroke-width=\"4\">{}</text>",
        mid.x,
        mid.y,
        TEXT_COLOR,
        EDGE_LABEL_FONT_SIZE,
        escape_xml(label)
    )?;
    Ok(())
}

struct NodeBox<'a> {
    node: &'a Node,
    center: Point,
    width: f32,
    height: f32,
    fill: &'a str,
    stroke: &'a str,
    text: &'a str,
}

fn write_node(svg: &mut String, node_box: &NodeBox<'_>) -> Result<()> {
    let NodeBox {
        node,
        center,
        width,
        height,
        fill,
        stroke,
        text,
    } = *node_box;

    write!(
        svg,
        "  <g data-node-id=\"{}\">\n    <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"12\" ry=\"12\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\" />\n",
        escape_xml(&node.id),
        center.x - width / 2.0,
        center.y - height / 2.0,
        width,
        height,
        escape_xml(fill),
        escape_xml(stroke)
    )?;

    if !node.description.trim().is_empty() {
        writeln!(svg, "    <title>{}</title>", escape_xml(node.description.trim()))?;
    }

    let lines = wrap_label(node.display_label(), width - TEXT_INSET, MAX_LABEL_LINES);
    if lines.len() <= 1 {
        writeln!(
            svg,
            "    <text x=\"{:.1}\" y=\"{:.1}\" fill=\"{}\" font-size=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>",
            center.x,
            center.y,
            escape_xml(text),
            LABEL_FONT_SIZE,
            escape_xml(lines.first().map(String::as_str).unwrap_or(""))
        )?;
    } else {
        let start_y = center.y - LABEL_LINE_HEIGHT * (lines.len() as f32 - 1.0) / 2.0;
        writeln!(
            svg,
            "    <text x=\"{:.1}\" fill=\"{}\" font-size=\"{}\" text-anchor=\"middle\">",
            center.x,
            escape_xml(text),
            LABEL_FONT_SIZE
        )?;
        for (idx, line) in lines.iter().enumerate() {
            writeln!(
                svg,
                "      <tspan x=\"{:.1}\" y=\"{:.1}\" dominant-baseline=\"middle\">{}</tspan>",
                center.x,
                start_y + LABEL_LINE_HEIGHT * idx as f32,
                escape_xml(line)
            )?;
        }
        svg.push_str("    </text>\n");
    }

    svg.push_str("  </g>\n");
    Ok(())
}

impl Layout {
    /// Curves first, then one box per positioned node in level order.
    pub fn render_svg(&self, background: &str) -> Result<String> {
        let mut svg = String::new();
        write_header(&mut svg, self.view_box, background)?;

        for curve in &self.curves {
            write_curve(&mut svg, curve, EDGE_STROKE)?;
        }

        let lookup = node_lookup(&self.nodes);
        let mut drawn: HashSet<&str> = HashSet::new();
        for id in self.levels.iter().flatten() {
            if !drawn.insert(id.as_str()) {
                continue;
            }
            let (Some(node), Some(center)) = (lookup.get(id.as_str()), self.position(id)) else {
                continue;
            };
            write_node(
                &mut svg,
                &NodeBox {
                    node,
                    center,
                    width: self.node_width,
                    height: self.node_height,
                    fill: NODE_FILL,
                    stroke: NODE_STROKE,
                    text: TEXT_COLOR,
                },
            )?;
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }
}

impl MindMap {
    /// Branch-colored boxes with white text; curves take their target's color.
    pub fn render_svg(&self, background: &str) -> Result<String> {
        let mut svg = String::new();
        write_header(&mut svg, ViewBox::from(self.canvas), background)?;

        for curve in &self.curves {
            write_curve(&mut svg, curve, self.curve_color(curve))?;
        }

        let lookup = node_lookup(&self.nodes);
        for entry in &self.tree {
            let Some(node) = lookup.get(entry.id.as_str()) else {
                continue;
            };
            write_node(
                &mut svg,
                &NodeBox {
                    node,
                    center: entry.position,
                    width: self.node_width,
                    height: self.node_height,
                    fill: &entry.color,
                    stroke: &entry.color,
                    text: "#ffffff",
                },
            )?;
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }
}
