use crate::error::Result;
use crate::geometry::{LineOption, LineShape, RectOption, RectShape, Shape, TextOption, TextShape};
use crate::layout::SequenceLayout;
use crate::theme::Theme;
use std::fmt::Write as _;
use std::path::Path;

const END_MARKER_PATH: &str = "M 0 0 L 5 2.5 L 0 5 z";
const START_MARKER_PATH: &str = "M 0 2.5 L 5 5 L 5 0 z";

/// Serialises every shape of the layout in creation order. The root element
/// takes `container_id` as its id; marker ids are derived from it.
pub fn render_svg(layout: &SequenceLayout, theme: &Theme, container_id: &str) -> String {
    let size = layout.size;
    let id = escape_xml(container_id);
    let mut svg = String::new();

    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"{id}\" width=\"{:.2}\" height=\"{:.2}\" viewBox=\"{:.2} {:.2} {:.2} {:.2}\">",
        size.width, size.height, size.min_x, size.min_y, size.width, size.height
    );
    let _ = write!(
        svg,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        size.min_x, size.min_y, theme.background
    );

    svg.push_str("<defs>");
    let _ = write!(
        svg,
        "<marker id=\"{id}-end\" markerWidth=\"5\" markerHeight=\"5\" refX=\"5\" refY=\"2.5\" orient=\"auto\"><path d=\"{END_MARKER_PATH}\" fill=\"{}\"/></marker>",
        theme.line_color
    );
    let _ = write!(
        svg,
        "<marker id=\"{id}-start\" markerWidth=\"5\" markerHeight=\"5\" refX=\"0\" refY=\"2.5\" orient=\"auto\"><path d=\"{START_MARKER_PATH}\" fill=\"{}\"/></marker>",
        theme.line_color
    );
    svg.push_str("</defs>");

    for shape in layout.canvas.shapes() {
        match shape {
            Shape::Line(line) => line_svg(&mut svg, line, theme, &id),
            Shape::Rect(rect) => rect_svg(&mut svg, rect, theme),
            Shape::Text(text) => text_svg(&mut svg, text, theme),
        }
    }

    svg.push_str("</svg>");
    svg
}

fn line_svg(svg: &mut String, line: &LineShape, theme: &Theme, id: &str) {
    let _ = write!(
        svg,
        "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{}\"",
        line.x1, line.y1, line.x2, line.y2, theme.line_color, theme.line_width
    );
    if line.options.contains(&LineOption::EndMarker) {
        let _ = write!(svg, " marker-end=\"url(#{id}-end)\"");
    }
    if line.options.contains(&LineOption::StartMarker) {
        let _ = write!(svg, " marker-start=\"url(#{id}-start)\"");
    }
    if line.options.contains(&LineOption::Dotted) {
        svg.push_str(" stroke-dasharray=\"5,5\"");
    }
    svg.push_str("/>");
}

fn rect_svg(svg: &mut String, rect: &RectShape, theme: &Theme) {
    let thin = rect.options.contains(&RectOption::Thin);
    let dotted = rect.options.contains(&RectOption::Dotted);
    let (fill, stroke, width) = if thin || dotted {
        ("none", theme.block_border.as_str(), 1.0)
    } else {
        (
            theme.actor_fill.as_str(),
            theme.actor_border.as_str(),
            theme.line_width,
        )
    };
    let _ = write!(
        svg,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{width}\"",
        rect.x, rect.y, rect.width, rect.height
    );
    if dotted {
        svg.push_str(" stroke-dasharray=\"5,5\"");
    }
    svg.push_str("/>");
}

fn text_svg(svg: &mut String, text: &TextShape, theme: &Theme) {
    let _ = write!(
        svg,
        "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{:.2}\" fill=\"{}\"",
        text.x,
        text.y,
        escape_xml(&theme.font_family),
        text.font_size,
        theme.text_color
    );
    if text.options.contains(&TextOption::Centered) {
        svg.push_str(" text-anchor=\"middle\" dominant-baseline=\"middle\"");
    }
    if text.options.contains(&TextOption::Title) {
        svg.push_str(" font-weight=\"bold\"");
    }
    let _ = write!(svg, ">{}</text>", escape_xml(&text.text));
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(
    svg: &str,
    output: &Path,
    render_cfg: &crate::config::RenderConfig,
    theme: &Theme,
) -> Result<()> {
    use crate::error::Error;

    let mut opt = usvg::Options::default();
    if let Some(family) = theme.font_family.split(',').next() {
        opt.font_family = family.trim().trim_matches('"').to_string();
    }
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .or_else(|| usvg::Size::from_wh(800.0, 600.0))
        .ok_or_else(|| Error::Png("invalid default size".to_string()))?;

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|err| Error::Png(err.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| Error::Png("failed to allocate pixmap".to_string()))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap
        .save_png(output)
        .map_err(|err| Error::Png(err.to_string()))?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
