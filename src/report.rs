use std::{fmt, path::PathBuf};

use crate::frequency::Vocabulary;

#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub rank: usize,
    pub token: String,
    pub score: f64,
    /// Percentage of the vocabulary's total score.
    pub share: f64,
}

impl ReportRow {
    pub fn score_label(&self) -> String {
        format_score(self.score)
    }

    pub fn share_label(&self) -> String {
        format!("{:.2}%", self.share)
    }
}

/// Top `k` rows of `vocabulary` with rank and share.
pub fn rows(vocabulary: &Vocabulary, k: usize) -> Vec<ReportRow> {
    let total = vocabulary.total();

    vocabulary
        .top_k(k)
        .into_iter()
        .enumerate()
        .map(|(i, (token, score))| ReportRow {
            rank: i + 1,
            token: token.to_string(),
            score,
            share: if total > 0.0 { score / total * 100.0 } else { 0.0 },
        })
        .collect()
}

/// 整数词频用空格分千位，小数保留两位
pub fn format_score(score: f64) -> String {
    if score.fract() != 0.0 {
        return format!("{score:.2}");
    }

    let digits = format!("{}", score.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    if score < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}

#[derive(Clone, Debug)]
pub struct RegionReport {
    pub region: String,
    pub document: PathBuf,
    pub mask: Option<PathBuf>,
    pub vocabulary_size: usize,
    pub total: f64,
    pub rows: Vec<ReportRow>,
    pub cloud_image: Option<PathBuf>,
    pub table_image: Option<PathBuf>,
}

impl fmt::Display for RegionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({} words, total {})",
            self.region,
            self.vocabulary_size,
            format_score(self.total)
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "  Top{:<3} {:<10} {:>10} {:>8}",
                row.rank,
                row.token,
                row.score_label(),
                row.share_label()
            )?;
        }
        Ok(())
    }
}
