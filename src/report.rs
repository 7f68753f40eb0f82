use std::fs;
use std::io;
use std::path::Path;

use html_escape::{encode_double_quoted_attribute, encode_text};
use log::info;

use crate::snapshot::Dataset;

const PAGE_STYLE: &str = "\
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 0;
       background-color: #f4f7fa; color: #333; line-height: 1.6; }
.container { max-width: 1200px; margin: 30px auto; padding: 20px;
             background-color: #fff; border-radius: 8px;
             box-shadow: 0 4px 12px rgba(0, 0, 0, 0.08); }
h1 { color: #2c3e50; text-align: center; margin-bottom: 30px; }
table { width: 100%; border-collapse: collapse; margin-top: 25px; }
th, td { border: 1px solid #e0e6ed; padding: 12px 15px; text-align: left; }
th { background-color: #4caf50; color: white; text-transform: uppercase;
     letter-spacing: 0.05em; font-size: 0.9em; }
tr:nth-child(even) { background-color: #f8fcf9; }
tr:hover { background-color: #e8f5e9; }
a { color: #007bff; text-decoration: none; }
a:hover { text-decoration: underline; }";

/// Renders the dataset as a browsable HTML table, one row per credit union,
/// rates one per line, site links clickable.
pub fn render(dataset: &Dataset) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str("<title>Mortgage Rates</title>\n");
    html.push_str(&format!("<style>\n{}\n</style>\n", PAGE_STYLE));
    html.push_str("</head>\n<body>\n<div class=\"container\">\n<h1>Mortgage Rates</h1>\n");
    html.push_str("<table>\n<thead>\n<tr>");
    for header in ["Credit Union", "Link", "Rates", "Best Rate"] {
        html.push_str(&format!("<th>{}</th>", header));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for record in dataset.values() {
        html.push_str("<tr>");
        html.push_str(&format!("<td>{}</td>", encode_text(&record.name)));
        html.push_str(&format!(
            "<td><a href=\"{}\" target=\"_blank\">{}</a></td>",
            encode_double_quoted_attribute(&record.url),
            encode_text(&record.url)
        ));
        html.push_str(&format!("<td>{}</td>", rates_cell(&record.rates)));
        html.push_str(&format!("<td>{}</td>", encode_text(&record.best_rate)));
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</div>\n</body>\n</html>\n");
    html
}

/// The pipe-delimited form reads better with one program per line.
fn rates_cell(rates: &str) -> String {
    rates
        .split('|')
        .map(|entry| encode_text(entry).into_owned())
        .collect::<Vec<_>>()
        .join("<br>")
}

pub fn write<P: AsRef<Path>>(path: P, dataset: &Dataset) -> io::Result<()> {
    let path = path.as_ref();
    fs::write(path, render(dataset))?;
    info!("Wrote HTML report with {} rows to {}", dataset.len(), path.display());
    Ok(())
}
