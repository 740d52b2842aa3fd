use std::path::Path;
use walkdir::WalkDir;

/// Charts are picked up by this file extension
pub const CHART_EXTENSION: &str = "png";

/// A chart image found in the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRef {
    pub file_name: String,
    pub title: String,
}

/// Find chart images directly inside `dir`, sorted by file name.
pub(crate) fn discover_charts(dir: &Path) -> Vec<ChartRef> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping entry while looking for charts: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let file_name = entry.file_name().to_str()?.to_string();
            let stem = file_name.strip_suffix(&format!(".{CHART_EXTENSION}"))?;
            Some(ChartRef {
                title: chart_title(stem),
                file_name,
            })
        })
        .collect()
}

/// `tokens_per_eth` becomes `Tokens Per Eth`
pub fn chart_title(stem: &str) -> String {
    let mut title = String::with_capacity(stem.len());
    let mut in_word = false;
    for c in stem.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if in_word {
                title.extend(c.to_lowercase());
            } else {
                title.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            title.push(c);
            in_word = false;
        }
    }
    title
}
