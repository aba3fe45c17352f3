// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Table rendering for CLI output.

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use herd_core::{CurveKind, CurveLibrary, Preview, RelationshipConfig, RelationshipInfo, TickReport};

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn relationships<'a>(infos: impl Iterator<Item = &'a RelationshipInfo>) -> Table {
    let mut out = table(vec![
        "id", "relation", "members", "raw", "normalized", "curved", "status",
    ]);
    for info in infos {
        let config = info.config();
        out.add_row(vec![
            Cell::new(info.id()),
            Cell::new(config.relation),
            Cell::new(config.members.join(", ")),
            Cell::new(info.raw()),
            Cell::new(format!("{:.4}", info.normalized())),
            Cell::new(format!("{:.4}", info.curved())),
            Cell::new(info.status()),
        ]);
    }
    out
}

pub fn changes(report: &TickReport) -> Vec<String> {
    report
        .changes
        .iter()
        .map(|c| format!("tick {}: {} {} -> {}", report.tick, c.id, c.from, c.to))
        .collect()
}

pub fn preview(config: &RelationshipConfig, preview: &Preview) -> Table {
    let mut out = table(vec!["field", "value"]);
    out.add_row(vec![Cell::new("relationship"), Cell::new(config.id)]);
    out.add_row(vec![Cell::new("raw"), Cell::new(&preview.raw)]);
    out.add_row(vec![
        Cell::new("normalized"),
        Cell::new(format!("{:.4}", preview.normalized)),
    ]);
    out.add_row(vec![
        Cell::new("curved"),
        Cell::new(format!("{:.4}", preview.curved)),
    ]);
    out.add_row(vec![
        Cell::new("as_axis"),
        Cell::new(format!("{:.4}", preview.as_axis)),
    ]);
    out.add_row(vec![Cell::new("over"), Cell::new(preview.over)]);
    out.add_row(vec![Cell::new("under"), Cell::new(preview.under)]);
    out.add_row(vec![Cell::new("in_range"), Cell::new(preview.in_range)]);
    out
}

/// One row per library curve, sampled at `samples` evenly spaced inputs.
pub fn curves(library: &CurveLibrary, samples: usize) -> Table {
    let steps = samples.max(2);
    let inputs: Vec<f32> = (0..steps).map(|i| i as f32 / (steps - 1) as f32).collect();
    let mut header = vec!["curve".to_owned()];
    header.extend(inputs.iter().map(|t| format!("{t:.2}")));
    let mut out = table(header.iter().map(String::as_str).collect());
    for kind in CurveKind::LIBRARY {
        let Some(curve) = library.get(kind) else {
            continue;
        };
        let mut row = vec![Cell::new(format!("{kind:?}"))];
        row.extend(inputs.iter().map(|t| Cell::new(format!("{:.3}", curve.evaluate(*t)))));
        out.add_row(row);
    }
    out
}

pub fn stored(configs: &[RelationshipConfig]) -> Table {
    let mut out = table(vec![
        "id", "relation", "members", "min", "max", "curve", "enabled", "description",
    ]);
    for config in configs {
        out.add_row(vec![
            Cell::new(config.id),
            Cell::new(config.relation),
            Cell::new(config.members.join(", ")),
            Cell::new(config.min),
            Cell::new(config.max),
            Cell::new(format!("{:?}", config.curve.kind)),
            Cell::new(config.enabled),
            Cell::new(&config.description),
        ]);
    }
    out
}
