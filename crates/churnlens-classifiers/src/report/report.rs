use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = "
body { font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif; margin: 0; background: #fafafa; color: #222; }
header { background: #1f77b4; color: white; padding: 16px 32px; }
header h1 { margin: 0; font-size: 1.6em; }
header p { margin: 4px 0 0 0; opacity: 0.85; }
section { background: white; margin: 24px 32px; padding: 16px 24px; border-radius: 6px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
section h2 { margin-top: 0; }
.plot-grid { display: flex; flex-wrap: wrap; gap: 16px; }
.plot-grid > div { flex: 1 1 480px; }
footer { margin: 24px 32px; font-size: 0.8em; color: #777; }
";

/// A titled block of HTML content and plots.
pub struct ReportSection {
    title: String,
    content: Vec<Markup>,
    plots: Vec<Plot>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            content: Vec::new(),
            plots: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.content.push(content);
    }

    pub fn add_plot(&mut self, plot: Plot) {
        self.plots.push(plot);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn render(&self, section_idx: usize) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.content {
                    (block)
                }
                @if !self.plots.is_empty() {
                    div class="plot-grid" {
                        @for (plot_idx, plot) in self.plots.iter().enumerate() {
                            @let div_id = format!("plot-{}-{}", section_idx, plot_idx);
                            div {
                                (PreEscaped(plot.to_inline_html(Some(div_id.as_str()))))
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Self-contained HTML report. Plotly figures are rendered client-side from
/// the CDN build.
pub struct Report {
    app_name: String,
    version: String,
    title: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(app_name: &str, version: &str, title: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            version: version.to_string(),
            title: title.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub fn render(&self) -> Markup {
        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style { (PreEscaped(STYLE)) }
                }
                body {
                    header {
                        h1 { (self.title) }
                        p { (self.app_name) " v" (self.version) }
                    }
                    @for (idx, section) in self.sections.iter().enumerate() {
                        (section.render(idx))
                    }
                    footer { "Generated " (generated) }
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(&path, self.render().into_string())
            .with_context(|| format!("Failed to write report: {}", path.as_ref().display()))?;
        log::info!("Report written to {}", path.as_ref().display());
        Ok(())
    }
}
