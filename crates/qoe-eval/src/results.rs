//! Results table: JSON lines plus a per-controller summary

use std::collections::BTreeMap;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::{EvalResult, Observation};

/// Writes one JSON document per line
pub struct ResultsWriter<W: Write> {
    out: W,
    rows: usize,
}

impl<W: Write> ResultsWriter<W> {
    pub fn new(out: W) -> Self {
        ResultsWriter { out, rows: 0 }
    }

    pub fn write<T: Serialize>(&mut self, row: &T) -> EvalResult<()> {
        serde_json::to_writer(&mut self.out, row)?;
        self.out.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_all<'a, T: Serialize + 'a>(
        &mut self,
        rows: impl IntoIterator<Item = &'a T>,
    ) -> EvalResult<()> {
        for row in rows {
            self.write(row)?;
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> EvalResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Mean MOS for one (controller, loss) cell
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub controller: String,
    pub packet_loss_percent: f64,
    pub samples: usize,
    pub mean_mos: f64,
}

/// Cells ordered by controller name, then loss
pub fn summarize(observations: &[Observation]) -> Vec<SummaryRow> {
    // loss keyed in thousandths of a percent so the map key is ordered
    let mut cells: BTreeMap<(&str, i64), (f64, f64, usize)> = BTreeMap::new();
    for obs in observations {
        let key = (
            obs.controller.as_str(),
            (obs.packet_loss_percent * 1000.0).round() as i64,
        );
        let cell = cells
            .entry(key)
            .or_insert((obs.packet_loss_percent, 0.0, 0));
        cell.1 += obs.mos;
        cell.2 += 1;
    }

    cells
        .into_iter()
        .map(|((controller, _), (loss, total, samples))| SummaryRow {
            controller: controller.to_string(),
            packet_loss_percent: loss,
            samples,
            mean_mos: total / samples as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use qoe_core::Configuration;

    fn obs(controller: &str, loss: f64, mos: f64) -> Observation {
        Observation {
            input: "clip".into(),
            controller: controller.into(),
            packet_loss_percent: loss,
            configuration: Configuration::BASELINE,
            branch: None,
            predicted_score: None,
            mos,
            processing_ms: 1.0,
        }
    }

    #[test]
    fn test_summary_means_and_order() {
        let observations = vec![
            obs("static", 5.0, 3.0),
            obs("hybrid", 5.0, 4.0),
            obs("static", 0.0, 4.0),
            obs("static", 5.0, 2.0),
        ];

        let summary = summarize(&observations);
        let cells: Vec<_> = summary
            .iter()
            .map(|r| (r.controller.as_str(), r.packet_loss_percent, r.samples, r.mean_mos))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("hybrid", 5.0, 1, 4.0),
                ("static", 0.0, 1, 4.0),
                ("static", 5.0, 2, 2.5),
            ]
        );
    }

    #[test]
    fn test_json_lines() {
        let mut writer = ResultsWriter::new(Vec::new());
        writer
            .write_all(&[obs("static", 0.0, 4.1), obs("heuristic", 10.0, 3.2)])
            .unwrap();
        assert_eq!(writer.rows(), 2);

        let bytes = writer.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let back: Observation = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(back, obs("heuristic", 10.0, 3.2));
        assert!(!lines[0].contains("branch"));
    }
}
