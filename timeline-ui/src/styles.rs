#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-trend-ui]";

/// Default CSS for the trend chart along with overridable design tokens.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --trend-font-family: 'Inter', system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
  --trend-bg: #ffffff;
  --trend-border: rgba(148, 163, 184, 0.32);
  --trend-radius: 16px;
  --trend-text: #1f2933;
  --trend-muted: #52606d;
  --trend-grid: rgba(148, 163, 184, 0.28);
  --trend-hover: rgba(37, 99, 235, 0.06);
  --trend-reference: rgba(22, 163, 74, 0.55);
  --trend-status-normal: #067647;
  --trend-status-high: #b42318;
  --trend-status-low: #0b5394;
  --trend-status-attention: #dc6803;
}

.trend-root {
  font-family: var(--trend-font-family);
  background: var(--trend-bg);
  color: var(--trend-text);
  border: 1px solid var(--trend-border);
  border-radius: var(--trend-radius);
  padding: 24px;
  display: flex;
  flex-direction: column;
  gap: 18px;
}

.trend-header h2 {
  margin: 0;
  font-size: 1.15rem;
}

.trend-header p {
  margin: 4px 0 0;
  color: var(--trend-muted);
  font-size: 0.85rem;
}

.trend-selector {
  display: flex;
  flex-wrap: wrap;
  gap: 8px 14px;
}

.trend-option {
  display: inline-flex;
  align-items: center;
  gap: 6px;
  font-size: 0.85rem;
  cursor: pointer;
}

.trend-tabs {
  display: flex;
  flex-wrap: wrap;
  gap: 6px;
}

.trend-tab {
  border: 1px solid var(--trend-border);
  background: transparent;
  border-radius: 999px;
  padding: 4px 12px;
  font-size: 0.8rem;
  cursor: pointer;
}

.trend-tab.is-active {
  background: var(--trend-text);
  color: var(--trend-bg);
}

.trend-exams {
  padding-top: 10px;
  border-top: 1px dashed var(--trend-border);
}

.trend-swatch {
  width: 10px;
  height: 10px;
  border-radius: 999px;
}

.trend-svg {
  width: 100%;
  height: auto;
}

.trend-svg .trend-grid {
  stroke: var(--trend-grid);
  stroke-width: 1;
}

.trend-svg .trend-axis-label {
  fill: var(--trend-muted);
  font-size: 11px;
}

.trend-svg .trend-reference {
  stroke: var(--trend-reference);
  stroke-dasharray: 4 4;
  stroke-width: 1;
}

.trend-svg .trend-line {
  fill: none;
  stroke-width: 2.2;
  stroke-linejoin: round;
}

.trend-svg .trend-column {
  fill: transparent;
}

.trend-svg .trend-column.is-hovered {
  fill: var(--trend-hover);
}

.trend-tooltip {
  border: 1px solid var(--trend-border);
  border-radius: 10px;
  padding: 10px 14px;
  font-size: 0.85rem;
}

.trend-tooltip h3 {
  margin: 0 0 6px;
  font-size: 0.9rem;
}

.trend-tooltip ul {
  list-style: none;
  margin: 0;
  padding: 0;
  display: grid;
  gap: 4px;
}

.trend-status[data-status="normal"] { color: var(--trend-status-normal); }
.trend-status[data-status="high"] { color: var(--trend-status-high); }
.trend-status[data-status="low"] { color: var(--trend-status-low); }
.trend-status[data-status="attention"] { color: var(--trend-status-attention); }

.trend-infos h3 {
  margin: 0 0 10px;
  font-size: 0.95rem;
}

.trend-info-grid {
  display: grid;
  grid-template-columns: repeat(auto-fill, minmax(200px, 1fr));
  gap: 12px;
}

.trend-info {
  border: 1px solid var(--trend-border);
  border-left-width: 4px;
  border-radius: 10px;
  padding: 12px;
  font-size: 0.85rem;
}

.trend-info p {
  margin: 4px 0 0;
  color: var(--trend-muted);
}

.trend-empty {
  color: var(--trend-muted);
  text-align: center;
  padding: 48px 12px;
}

@media (max-width: 640px) {
  .trend-root {
    padding: 16px;
  }

  .trend-selector {
    flex-direction: column;
  }
}
"#;

pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("Documento sem elemento <head>"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-trend-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
