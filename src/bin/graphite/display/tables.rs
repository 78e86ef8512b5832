use std::io::{self, Write};

use graphite::io::Structure;
use graphite::nn::{NequipConfig, NetworkPlan};

use crate::util::text::truncate;

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

pub fn print_config_info(config: &NequipConfig) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let radial = config
        .radial_neurons
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" → ");

    let rows = vec![
        ("Irreps In", config.irreps_in.to_string()),
        ("Irreps Hidden", config.irreps_hidden.to_string()),
        ("Irreps Out", config.irreps_out.to_string()),
        ("Irreps Node", config.irreps_node.to_string()),
        ("Irreps Edge", config.irreps_edge.to_string()),
        ("Convolutions", config.num_convs.to_string()),
        ("Radial Net", radial),
        ("Species", config.num_species.to_string()),
        ("Max Radius", format!("{:.3}", config.max_radius)),
        ("Neighbours", format!("{:.1}", config.num_neighbors)),
    ];

    print_kv_table(&mut out, "Model Configuration", &rows);
}

pub fn print_structure_info(structure: &Structure, num_edges: usize, cutoff: f64) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let (_, kinds) = structure.species();
    let mut rows = vec![
        ("Total Atoms", structure.len().to_string()),
        ("Elements", kinds.join(" ")),
        ("Edges", num_edges.to_string()),
        ("Cutoff", format!("{:.3}", cutoff)),
    ];
    if !structure.comment.is_empty() {
        rows.push(("Comment", structure.comment.clone()));
    }

    print_kv_table(&mut out, "Structure Summary", &rows);
}

/// Writes the representation chain of `plan`, one row per interaction.
///
/// Columns widen to fit the irreps, which are never truncated.
pub fn write_plan_table(out: &mut impl Write, plan: &NetworkPlan) -> io::Result<()> {
    let mut rows: Vec<[String; 4]> = plan
        .layers
        .iter()
        .enumerate()
        .map(|(idx, layer)| {
            [
                idx.to_string(),
                layer.interaction.irreps_in.to_string(),
                layer.interaction.irreps_out.to_string(),
                layer.irreps_out.to_string(),
            ]
        })
        .collect();
    rows.push([
        plan.layers.len().to_string(),
        plan.output.irreps_in.to_string(),
        plan.output.irreps_out.to_string(),
        "-".to_string(),
    ]);

    let header = ["Layer", "Irreps In", "Interaction Out", "Gate Out"];
    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let rule = |left: &str, mid: &str, right: &str| {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}{}", INDENT, left, segments.join(mid), right)
    };

    writeln!(out, "{}┌─ Network Plan ─┐", INDENT)?;
    writeln!(out, "{}", rule("┌", "┬", "┐"))?;
    writeln!(
        out,
        "{}│ {:>w0$} │ {:<w1$} │ {:<w2$} │ {:<w3$} │",
        INDENT,
        header[0],
        header[1],
        header[2],
        header[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3]
    )?;
    writeln!(out, "{}", rule("├", "┼", "┤"))?;
    for row in &rows {
        writeln!(
            out,
            "{}│ {:>w0$} │ {:<w1$} │ {:<w2$} │ {:<w3$} │",
            INDENT,
            row[0],
            row[1],
            row[2],
            row[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3]
        )?;
    }
    writeln!(out, "{}", rule("└", "┴", "┘"))?;
    Ok(())
}

fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 16usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(
        out,
        "{}┌{k_line}┬{v_line}┐",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );
    let _ = writeln!(
        out,
        "{}│ {:<key_w$} │ {:>val_w$} │",
        INDENT, "Setting", "Value",
    );
    let _ = writeln!(
        out,
        "{}├{k_line}┼{v_line}┤",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );

    for (key, val) in rows {
        let _ = writeln!(
            out,
            "{}│ {:<key_w$} │ {:>val_w$} │",
            INDENT,
            truncate(key, key_w),
            truncate(val, val_w),
        );
    }

    let _ = writeln!(
        out,
        "{}└{k_line}┴{v_line}┘",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphite::nn::plan_layers;

    #[test]
    fn plan_table_lists_every_interaction() {
        let config = NequipConfig::from_toml_str(
            r#"
            irreps_in = "4x0e"
            irreps_hidden = "4x0e + 2x1e"
            irreps_out = "1x0e"
            num_convs = 3
            "#,
        )
        .unwrap();
        let plan = plan_layers(&config).unwrap();

        let mut buf = Vec::new();
        write_plan_table(&mut buf, &plan).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let body: Vec<_> = text.lines().filter(|l| l.contains('│')).collect();
        assert_eq!(body.len(), 1 + 3);
        assert!(body[1].contains("4x0e"));
        assert!(body[3].contains("1x0e"));

        let widths: Vec<_> = text.lines().skip(1).map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }
}
