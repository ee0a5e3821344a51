//! The dashboard page.
//!
//! Figures are fetched by the browser from the render endpoints; a failed
//! fetch shows the server's message in place of that one figure.

use forecast_common::{MAX_DAY, MIN_DAY};

use crate::config::DashboardConfig;

const STYLE: &str = r#"
body { font-family: "DejaVu Sans", Arial, sans-serif; margin: 2rem auto; max-width: 1200px; color: #222; }
h1 { margin-bottom: 0.2rem; }
.tabs { display: flex; gap: 0.5rem; border-bottom: 1px solid #ccc; margin-top: 1.5rem; }
.tabs button { border: none; background: none; padding: 0.6rem 1rem; cursor: pointer; font-size: 1rem; }
.tabs button.active { border-bottom: 3px solid #2171b5; font-weight: bold; }
.tab-panel { display: none; padding-top: 1rem; }
.tab-panel.active { display: block; }
.figure img { max-width: 100%; }
.notice { padding: 0.8rem 1rem; border-radius: 4px; }
.notice.warning { background: #fff8e1; border: 1px solid #f0c36d; }
.notice.error { background: #fdecea; border: 1px solid #f5a49b; }
.about { background: #f4f8fb; padding: 1rem; border-radius: 4px; margin-top: 1.5rem; }
.daily { margin-top: 2.5rem; }
pre { background: #f6f6f6; padding: 1rem; overflow-x: auto; }
"#;

const SCRIPT: &str = r#"
function showNotice(container, status, text) {
  const div = document.createElement('div');
  div.className = 'notice ' + (status === 404 ? 'warning' : 'error');
  div.textContent = text;
  container.replaceChildren(div);
}

async function loadFigure(container, url, alt) {
  container.textContent = 'Loading...';
  try {
    const response = await fetch(url);
    if (!response.ok) {
      showNotice(container, response.status, await response.text());
      return;
    }
    const img = document.createElement('img');
    img.alt = alt;
    img.src = URL.createObjectURL(await response.blob());
    container.replaceChildren(img);
  } catch (err) {
    showNotice(container, 0, 'An error occurred loading the figure: ' + err);
  }
}

function selectTab(key) {
  document.querySelectorAll('.tabs button').forEach(b => b.classList.toggle('active', b.dataset.key === key));
  document.querySelectorAll('.tab-panel').forEach(p => {
    const active = p.dataset.key === key;
    p.classList.toggle('active', active);
    const figure = p.querySelector('.figure');
    if (active && !figure.dataset.loaded) {
      figure.dataset.loaded = 'true';
      loadFigure(figure, '/render/month/' + key, p.dataset.label);
    }
  });
}

async function loadSummary(day) {
  const pre = document.getElementById('raw-data');
  const response = await fetch('/api/daily/' + day + '/summary');
  const text = await response.text();
  pre.textContent = response.ok ? JSON.stringify(JSON.parse(text), null, 2) : text;
}

function selectDay(day) {
  document.getElementById('day-value').textContent = day;
  document.getElementById('raw-label').textContent = 'View Raw Data for ' + RAW_PREFIX + ' ' + day;
  loadFigure(document.getElementById('daily-figure'), '/render/daily/' + day, 'Day ' + day);
  if (document.getElementById('raw').open) {
    loadSummary(day);
  }
}

document.addEventListener('DOMContentLoaded', () => {
  document.querySelectorAll('.tabs button').forEach(b => b.addEventListener('click', () => selectTab(b.dataset.key)));
  const first = document.querySelector('.tabs button');
  if (first) {
    selectTab(first.dataset.key);
  }
  const slider = document.getElementById('day');
  slider.addEventListener('change', () => selectDay(slider.value));
  slider.addEventListener('input', () => { document.getElementById('day-value').textContent = slider.value; });
  document.getElementById('raw').addEventListener('toggle', e => {
    if (e.target.open) {
      loadSummary(slider.value);
    }
  });
  selectDay(slider.value);
});
"#;

/// Render the full HTML page for a configuration.
pub fn render_page(config: &DashboardConfig) -> String {
    let daily = &config.daily.period;
    let month_name = daily.month.name();
    let short_month: String = month_name.chars().take(3).collect();

    let mut tabs = String::new();
    let mut panels = String::new();
    for month in &config.months {
        let key = escape(&month.key());
        let label = escape(&month.label());
        tabs.push_str(&format!(
            "<button type=\"button\" data-key=\"{key}\">{label}</button>\n"
        ));
        panels.push_str(&format!(
            "<section class=\"tab-panel\" data-key=\"{key}\" data-label=\"{label}\">\n\
             <h3>Forecast for {label}</h3>\n\
             <div class=\"figure\"></div>\n\
             </section>\n"
        ));
    }

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape(&config.title)));
    html.push_str(&format!("<style>{}</style>\n", STYLE));
    html.push_str(&format!(
        "<script>const RAW_PREFIX = \"{}\";{}</script>\n",
        escape(&short_month),
        SCRIPT
    ));
    html.push_str("</head>\n<body>\n");

    html.push_str(&format!("<h1>&#10052;&#65039; {}</h1>\n", escape(&config.title)));
    html.push_str(&format!("<h2>{}</h2>\n", escape(&config.subtitle)));

    html.push_str(&format!("<nav class=\"tabs\">\n{}</nav>\n", tabs));
    html.push_str(&panels);

    html.push_str(&format!(
        "<div class=\"about\"><strong>About this Data</strong><p>{}</p></div>\n",
        escape(&config.about)
    ));

    html.push_str(&format!(
        "<section class=\"daily\">\n\
         <h2>&#128198; Daily Snow Forecast: {label}</h2>\n\
         <p>Use the slider below to view the high-resolution forecast for specific days.</p>\n\
         <label for=\"day\">Select a Day in {month}: <span id=\"day-value\">{min}</span></label><br>\n\
         <input type=\"range\" id=\"day\" min=\"{min}\" max=\"{max}\" value=\"{min}\" step=\"1\">\n\
         <div class=\"figure\" id=\"daily-figure\"></div>\n\
         <details id=\"raw\"><summary id=\"raw-label\">View Raw Data for {short} {min}</summary><pre id=\"raw-data\"></pre></details>\n\
         </section>\n",
        label = escape(&daily.label()),
        month = escape(month_name),
        short = escape(&short_month),
        min = MIN_DAY,
        max = MAX_DAY,
    ));

    html.push_str("</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_has_tabs_in_order() {
        let html = render_page(&DashboardConfig::default());
        let dec = html.find("data-key=\"december-2025\"").unwrap();
        let jan = html.find("data-key=\"january-2026\"").unwrap();
        let feb = html.find("data-key=\"february-2026\"").unwrap();
        assert!(dec < jan && jan < feb);
        assert!(html.contains("Forecast for January 2026"));
    }

    #[test]
    fn test_page_has_daily_slider() {
        let html = render_page(&DashboardConfig::default());
        assert!(html.contains("Daily Snow Forecast: December 2025"));
        assert!(html.contains("Select a Day in December"));
        assert!(html.contains("min=\"1\" max=\"31\" value=\"1\""));
        assert!(html.contains("View Raw Data for Dec 1"));
    }

    #[test]
    fn test_config_text_is_escaped() {
        let config = DashboardConfig {
            title: "<script>alert(1)</script>".to_string(),
            ..Default::default()
        };
        let html = render_page(&config);
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("&lt;script&gt;alert(1)"));
    }
}
