//! Layout planning: camera count + layout choice -> filter graph.
//!
//! Every per-input scale node resets timestamps (`setpts=PTS-STARTPTS`) so
//! downstream stack/overlay nodes see a common zero-based clock; camera
//! streams start their clocks independently and drift apart otherwise.

use crate::config::ConfigError;
use crate::filter::graph::{FilterGraph, FilterStatement};
use crate::models::{Layout, Resolution};

/// Graph node label for the composed video output.
pub const OUTPUT_LABEL: &str = "outv";

/// Plan the filter graph composing `camera_count` inputs onto the canvas.
///
/// - Side-by-side: one row of `floor(W/N)`-wide columns joined by `hstack`;
///   the rightmost column silently absorbs any flooring remainder.
/// - Grid: `ceil(sqrt(N))` rows by `ceil(N/rows)` columns joined by
///   `xstack`, filled row-major; trailing cells stay empty.
/// - Switch: a chain of N-1 `overlay` nodes, each enabled only during its
///   source's slot of the rotation cycle.
///
/// A single camera degenerates to a scale-only pass-through for every
/// layout: stack filters reject a single input, and a one-source switch
/// has no overlay chain.
pub fn plan(
    camera_count: usize,
    layout: &Layout,
    resolution: Resolution,
) -> Result<FilterGraph, ConfigError> {
    if camera_count < 1 {
        return Err(ConfigError::NoCameras);
    }
    if !resolution.is_valid() {
        return Err(ConfigError::InvalidResolution(resolution));
    }
    if let Layout::Switch { interval_secs } = layout {
        if *interval_secs == 0 {
            return Err(ConfigError::InvalidSwitchInterval);
        }
    }

    if camera_count == 1 {
        return Ok(pass_through(resolution));
    }

    Ok(match layout {
        Layout::SideBySide => side_by_side(camera_count, resolution),
        Layout::Grid => grid(camera_count, resolution),
        Layout::Switch { interval_secs } => switch(camera_count, *interval_secs, resolution),
    })
}

/// Whether source `index` is the visible layer at wall-clock second `t`
/// under a rotating switch of `count` sources.
///
/// Mirrors the enable expression emitted for the overlay chain: source
/// `index` owns the half-open window `[index*interval, (index+1)*interval)`
/// within each cycle of `count * interval` seconds. The windows partition
/// the cycle exactly, so exactly one source is visible at any instant.
pub fn source_visible_at(t_secs: u32, index: usize, count: usize, interval_secs: u32) -> bool {
    let cycle = count as u32 * interval_secs;
    let position = t_secs % cycle;
    let start = index as u32 * interval_secs;
    let end = (index as u32 + 1) * interval_secs;
    position >= start && position < end
}

fn scale_statement(index: usize, cell: Resolution) -> FilterStatement {
    FilterStatement::new(
        vec![format!("{index}:v")],
        format!("scale={}:{},setpts=PTS-STARTPTS", cell.width, cell.height),
        vec![format!("v{index}")],
    )
}

fn scaled_labels(count: usize) -> Vec<String> {
    (0..count).map(|index| format!("v{index}")).collect()
}

fn pass_through(resolution: Resolution) -> FilterGraph {
    let mut graph = FilterGraph::new(OUTPUT_LABEL);
    graph.push(FilterStatement::new(
        vec!["0:v".to_string()],
        format!(
            "scale={}:{},setpts=PTS-STARTPTS",
            resolution.width, resolution.height
        ),
        vec![OUTPUT_LABEL.to_string()],
    ));
    graph
}

fn side_by_side(count: usize, resolution: Resolution) -> FilterGraph {
    let cell = Resolution::new(resolution.width / count as u32, resolution.height);

    let mut graph = FilterGraph::new(OUTPUT_LABEL);
    for index in 0..count {
        graph.push(scale_statement(index, cell));
    }
    graph.push(FilterStatement::new(
        scaled_labels(count),
        format!("hstack=inputs={count}"),
        vec![OUTPUT_LABEL.to_string()],
    ));
    graph
}

fn grid(count: usize, resolution: Resolution) -> FilterGraph {
    let rows = (count as f64).sqrt().ceil() as usize;
    let columns = count.div_ceil(rows);
    let cell = Resolution::new(
        resolution.width / columns as u32,
        resolution.height / rows as u32,
    );

    let mut graph = FilterGraph::new(OUTPUT_LABEL);
    for index in 0..count {
        graph.push(scale_statement(index, cell));
    }

    // Row-major placement: input i lands at column i % columns, row i / columns.
    let placements: Vec<String> = (0..count)
        .map(|index| format!("{}_{}", index % columns, index / columns))
        .collect();
    graph.push(FilterStatement::new(
        scaled_labels(count),
        format!("xstack=inputs={}:layout={}", count, placements.join("|")),
        vec![OUTPUT_LABEL.to_string()],
    ));
    graph
}

fn switch(count: usize, interval_secs: u32, resolution: Resolution) -> FilterGraph {
    let mut graph = FilterGraph::new(OUTPUT_LABEL);
    for index in 0..count {
        graph.push(scale_statement(index, resolution));
    }

    // Overlay k stacks source k on top of the accumulated chain, enabled
    // only inside source k's window. Source 0 is the base layer: it shows
    // whenever every overlay is disabled, which is exactly its own window.
    let mut current = "v0".to_string();
    for index in 1..count {
        let output = if index == count - 1 {
            OUTPUT_LABEL.to_string()
        } else {
            format!("mix{index}")
        };
        graph.push(FilterStatement::new(
            vec![current, format!("v{index}")],
            format!(
                "overlay=shortest=1:enable='{}'",
                switch_enable_expr(index, count, interval_secs)
            ),
            vec![output.clone()],
        ));
        current = output;
    }
    graph
}

/// Boolean FFmpeg expression: the running timestamp, folded into the
/// rotation cycle, falls inside source `index`'s half-open window.
fn switch_enable_expr(index: usize, count: usize, interval_secs: u32) -> String {
    let cycle = count as u32 * interval_secs;
    let start = index as u32 * interval_secs;
    let end = (index as u32 + 1) * interval_secs;
    format!("gte(mod(t,{cycle}),{start})*lt(mod(t,{cycle}),{end})")
}
