//! Itinerary rendering
//!
//! Renders an itinerary to a self-contained printable HTML document via a
//! Handlebars template. Three style variants swap the stylesheet; cached
//! local images are inlined as base64 data URIs so the file stands alone.

use std::path::{Path, PathBuf};

use base64::Engine;
use eyre::{Context, Result};
use handlebars::Handlebars;
use tracing::info;

use crate::domain::Itinerary;

/// Visual style of the rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RenderStyle {
    #[default]
    Magazine,
    Minimal,
    Guidebook,
}

impl RenderStyle {
    fn stylesheet(&self) -> &'static str {
        match self {
            RenderStyle::Magazine => MAGAZINE_CSS,
            RenderStyle::Minimal => MINIMAL_CSS,
            RenderStyle::Guidebook => GUIDEBOOK_CSS,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            RenderStyle::Magazine => "magazine",
            RenderStyle::Minimal => "minimal",
            RenderStyle::Guidebook => "guidebook",
        }
    }
}

impl std::fmt::Display for RenderStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

const BASE_CSS: &str = r#"
body { max-width: 52rem; margin: 0 auto; padding: 2rem; }
h1 { margin-bottom: 0.25rem; }
.description { font-style: italic; }
.day { page-break-inside: avoid; margin-top: 2rem; }
.day img { max-width: 100%; border-radius: 4px; }
.activity { margin: 0.75rem 0 0.75rem 1rem; }
.activity .meta { font-size: 0.85rem; opacity: 0.75; }
.tip { margin-left: 1rem; font-size: 0.9rem; }
.packing ul { columns: 2; }
table.contacts td { padding: 0.15rem 0.75rem 0.15rem 0; }
@media print { body { padding: 0; } }
"#;

const MAGAZINE_CSS: &str = r#"
body { font-family: Georgia, 'Times New Roman', serif; color: #222; }
h1, h2 { font-family: 'Helvetica Neue', Arial, sans-serif; letter-spacing: -0.02em; }
h2 { border-bottom: 3px solid #d4a017; padding-bottom: 0.25rem; }
.description { color: #666; font-size: 1.1rem; }
"#;

const MINIMAL_CSS: &str = r#"
body { font-family: 'Helvetica Neue', Arial, sans-serif; color: #333; }
h2 { font-weight: 500; }
.day { border-top: 1px solid #ddd; padding-top: 1rem; }
"#;

const GUIDEBOOK_CSS: &str = r#"
body { font-family: 'Palatino Linotype', Palatino, serif; color: #1a2e1a; }
h2 { background: #eef3ee; padding: 0.4rem 0.6rem; border-left: 5px solid #3a6b3a; }
.tip { background: #fdf6e3; padding: 0.3rem 0.5rem; border-radius: 3px; }
"#;

const ITINERARY_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{title}}</title>
<style>{{{base_css}}}{{{style_css}}}</style>
</head>
<body>
<h1>{{title}}</h1>
{{#if description}}<p class="description">{{description}}</p>{{/if}}
<p>
{{#if start_date}}{{start_date}}{{#if end_date}} &ndash; {{end_date}}{{/if}} &middot; {{/if}}
{{travelers}} travelers
{{#if budget_estimate}} &middot; Budget: {{budget_estimate}}{{/if}}
</p>

{{#each days}}
<div class="day">
<h2>Day {{day_number}}: {{title}}</h2>
<p><strong>{{location}}</strong>{{#if date}} &middot; {{date}}{{/if}}{{#if weather_note}} &middot; {{weather_note}}{{/if}}</p>
{{#if summary}}<p>{{summary}}</p>{{/if}}
{{#each image_data}}<img src="{{this}}" alt="">{{/each}}
{{#each activities}}
<div class="activity">
<strong>{{name}}</strong> <span class="meta">({{activity_type}}{{#if start_time}}, {{start_time}}{{/if}}{{#if cost_estimate}}, {{cost_estimate}}{{/if}})</span>
<p>{{description}}</p>
{{#if booking_required}}<p class="meta">Booking required{{#if booking_link}}: {{booking_link}}{{/if}}</p>{{/if}}
{{#each tips}}<p class="tip">{{title}}: {{content}}</p>{{/each}}
</div>
{{/each}}
{{#each tips}}<p class="tip">{{title}}: {{content}}</p>{{/each}}
</div>
{{/each}}

{{#if general_tips}}
<h2>Good to Know</h2>
{{#each general_tips}}<p class="tip"><strong>{{title}}</strong> ({{category}}): {{content}}</p>{{/each}}
{{/if}}

{{#if packing_list}}
<div class="packing">
<h2>Packing List</h2>
<ul>{{#each packing_list}}<li>{{this}}</li>{{/each}}</ul>
</div>
{{/if}}

{{#if emergency_contacts}}
<h2>Emergency Contacts</h2>
<table class="contacts">
{{#each emergency_contacts}}<tr><td>{{@key}}</td><td>{{this}}</td></tr>{{/each}}
</table>
{{/if}}
</body>
</html>
"#;

/// Renders itineraries into the exports directory
pub struct ItineraryRenderer {
    exports_dir: PathBuf,
    hbs: Handlebars<'static>,
}

impl ItineraryRenderer {
    pub fn new(exports_dir: impl AsRef<Path>) -> Result<Self> {
        let mut hbs = Handlebars::new();
        hbs.register_template_string("itinerary", ITINERARY_TEMPLATE)
            .context("Failed to register itinerary template")?;

        Ok(Self {
            exports_dir: exports_dir.as_ref().to_path_buf(),
            hbs,
        })
    }

    /// Render an itinerary document, returning the output file path
    pub fn render(&self, itinerary: &Itinerary, style: RenderStyle) -> Result<PathBuf> {
        let mut context =
            serde_json::to_value(itinerary).context("Failed to serialize itinerary")?;
        context["base_css"] = serde_json::Value::String(BASE_CSS.to_string());
        context["style_css"] = serde_json::Value::String(style.stylesheet().to_string());

        // Inline cached images so the document stands alone
        if let Some(days) = context["days"].as_array_mut() {
            for day in days {
                let data_uris: Vec<serde_json::Value> = day["image_paths"]
                    .as_array()
                    .map(|paths| {
                        paths
                            .iter()
                            .filter_map(|p| p.as_str())
                            .filter_map(image_to_data_uri)
                            .map(serde_json::Value::String)
                            .collect()
                    })
                    .unwrap_or_default();
                day["image_data"] = serde_json::Value::Array(data_uris);
            }
        }

        let html = self
            .hbs
            .render("itinerary", &context)
            .context("Failed to render itinerary template")?;

        std::fs::create_dir_all(&self.exports_dir).context("Failed to create exports directory")?;

        let safe_title: String = itinerary
            .title
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let path = self
            .exports_dir
            .join(format!("{}_{}.html", safe_title, style.name()));

        std::fs::write(&path, html).context("Failed to write rendered itinerary")?;
        info!(path = %path.display(), "Rendered itinerary");
        Ok(path)
    }
}

/// Convert a local image file to a base64 data URI
fn image_to_data_uri(path: &str) -> Option<String> {
    let path = Path::new(path);
    let data = std::fs::read(path).ok()?;

    let mime = match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };

    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    Some(format!("data:{};base64,{}", mime, encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Activity, DayPlan, TravelTip};
    use tempfile::TempDir;

    fn sample_itinerary() -> Itinerary {
        let mut itinerary = Itinerary {
            title: "Lisbon Long Weekend".to_string(),
            description: "Hills, trams and pastries".to_string(),
            ..Default::default()
        };
        itinerary.packing_list = vec!["Walking shoes".to_string()];
        itinerary
            .emergency_contacts
            .insert("Police".to_string(), "112".to_string());
        itinerary.add_day(DayPlan {
            day_number: 1,
            date: None,
            title: "Alfama".to_string(),
            location: "Lisbon".to_string(),
            summary: "Old town on foot".to_string(),
            activities: vec![Activity {
                name: "Tram 28".to_string(),
                description: "Ride the classic tram.".to_string(),
                location: "Martim Moniz".to_string(),
                activity_type: Default::default(),
                start_time: None,
                end_time: None,
                cost_estimate: Some("€3".to_string()),
                booking_required: false,
                booking_link: None,
                tips: vec![TravelTip {
                    title: "Go early".to_string(),
                    content: "Queues build by 10am.".to_string(),
                    category: "general".to_string(),
                }],
                image_url: None,
                image_path: None,
            }],
            tips: vec![],
            weather_note: None,
            image_queries: vec![],
            image_paths: vec![],
        });
        itinerary
    }

    #[test]
    fn test_render_produces_html_file() {
        let temp = TempDir::new().unwrap();
        let renderer = ItineraryRenderer::new(temp.path()).unwrap();

        let path = renderer
            .render(&sample_itinerary(), RenderStyle::Magazine)
            .unwrap();

        assert!(path.exists());
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("Lisbon Long Weekend"));
        assert!(html.contains("Day 1: Alfama"));
        assert!(html.contains("Tram 28"));
        assert!(html.contains("Go early"));
        assert!(html.contains("Walking shoes"));
        assert!(html.contains("112"));
    }

    #[test]
    fn test_render_filename_per_style() {
        let temp = TempDir::new().unwrap();
        let renderer = ItineraryRenderer::new(temp.path()).unwrap();
        let itinerary = sample_itinerary();

        let a = renderer.render(&itinerary, RenderStyle::Magazine).unwrap();
        let b = renderer.render(&itinerary, RenderStyle::Minimal).unwrap();
        assert_ne!(a, b);
        assert!(a.to_string_lossy().contains("magazine"));
        assert!(b.to_string_lossy().contains("minimal"));
    }

    #[test]
    fn test_render_inlines_images() {
        let temp = TempDir::new().unwrap();
        let image_path = temp.path().join("tram.jpg");
        std::fs::write(&image_path, b"fake jpeg").unwrap();

        let mut itinerary = sample_itinerary();
        itinerary.days[0].image_paths = vec![image_path.to_string_lossy().to_string()];

        let renderer = ItineraryRenderer::new(temp.path()).unwrap();
        let path = renderer.render(&itinerary, RenderStyle::Guidebook).unwrap();
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_missing_images_are_skipped() {
        let temp = TempDir::new().unwrap();
        let mut itinerary = sample_itinerary();
        itinerary.days[0].image_paths = vec!["/no/such/file.jpg".to_string()];

        let renderer = ItineraryRenderer::new(temp.path()).unwrap();
        let path = renderer.render(&itinerary, RenderStyle::Minimal).unwrap();
        let html = std::fs::read_to_string(path).unwrap();
        assert!(!html.contains("data:image"));
    }

    #[test]
    fn test_data_uri_mime_by_extension() {
        let temp = TempDir::new().unwrap();
        let png = temp.path().join("x.png");
        std::fs::write(&png, b"png bytes").unwrap();

        let uri = image_to_data_uri(&png.to_string_lossy()).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }
}
