//! Static presentational content: company blurb, footer, stylesheet and the page shell

use crate::{
    services::{ExampleCatalog, EXAMPLES_PER_PAGE},
    types::{BlurIntensity, Feature},
};
use std::fmt::Write as _;

pub const TITLE: &str = "AI Background Studio";

/// Short description shown under the title
#[must_use]
pub fn company_info() -> &'static str {
    r#"<div class="company-info">
  <p>Remove, replace or blur backgrounds and upscale photos in seconds.
  Upload an image, pick a feature and drag the slider to compare the result with your original.</p>
</div>"#
}

#[must_use]
pub fn footer() -> &'static str {
    r#"<footer class="footer">
  <p>Images are processed for the current request only and are never stored.</p>
</footer>"#
}

/// Shown next to every result
#[must_use]
pub fn signup_prompt() -> &'static str {
    r#"<div class="signup-container">
  <h3>Want unlimited generations?</h3>
  <p>Free sessions include a limited number of generations. Sign up for unlimited access to every feature.</p>
</div>"#
}

#[must_use]
pub fn stylesheet() -> &'static str {
    r#"body { font-family: system-ui, sans-serif; margin: 0; background: #f5f7fb; color: #1d2433; }
header, main, .footer { max-width: 1100px; margin: 0 auto; padding: 1rem; }
.tabs { display: flex; gap: .5rem; border-bottom: 2px solid #d8deea; }
.tab-button { border: 0; background: none; padding: .75rem 1rem; cursor: pointer; font-size: 1rem; }
.tab-button.active { border-bottom: 3px solid #4f46e5; font-weight: 600; }
.tab-panel { display: none; gap: 1.5rem; padding-top: 1rem; }
.tab-panel.active { display: grid; grid-template-columns: 1fr 1fr; }
.column { display: flex; flex-direction: column; gap: .75rem; }
.button-gradient { background: linear-gradient(90deg, #4f46e5, #06b6d4); color: white; border: 0;
  padding: .75rem; border-radius: 8px; font-size: 1rem; cursor: pointer; }
.button-gradient:disabled { opacity: .6; cursor: wait; }
.examples { display: flex; flex-wrap: wrap; gap: .5rem; }
.gallery-pager { display: flex; align-items: center; gap: .5rem; margin-top: .5rem; }
.examples img { width: 72px; height: 72px; object-fit: cover; border-radius: 6px; cursor: pointer; }
.compare { position: relative; min-height: 300px; background: repeating-conic-gradient(#eee 0 25%, #fff 0 50%) 0 0 / 20px 20px; }
.compare img { position: absolute; inset: 0; width: 100%; height: 100%; object-fit: contain; }
.compare .after { clip-path: inset(0 0 0 50%); }
.error { color: #b91c1c; min-height: 1.2em; }
.signup-container { background: white; border-radius: 8px; padding: 1rem; text-align: center; }
.footer { color: #6b7280; font-size: .9rem; }
"#
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn example_thumbnail(feature: Feature, name: &str) -> String {
    let url = format!("/examples/{}/{}", feature.slug(), urlencoding::encode(name));
    format!(
        r#"<img src="{url}" alt="{alt}" data-example="{url}">"#,
        url = url,
        alt = escape_html(name)
    )
}

fn examples_block(catalog: &ExampleCatalog, feature: Feature) -> String {
    let examples = catalog.page(feature, 0);
    if examples.is_empty() {
        return String::new();
    }
    let page_count = catalog.page_count(feature);

    let mut html = format!(
        r#"<div class="gallery" data-feature="{slug}" data-page="0" data-pages="{pages}">
  <p>Try these examples!</p>
  <div class="examples">"#,
        slug = feature.slug(),
        pages = page_count
    );
    for example in examples.iter().take(EXAMPLES_PER_PAGE) {
        html.push_str(&example_thumbnail(feature, &example.name));
    }
    html.push_str("</div>");
    if page_count > 1 {
        let _ = write!(
            html,
            r#"
  <div class="gallery-pager">
    <button type="button" class="gallery-prev" disabled>Previous</button>
    <span class="gallery-position">1 / {pages}</span>
    <button type="button" class="gallery-next">Next</button>
  </div>"#,
            pages = page_count
        );
    }
    html.push_str("</div>");
    html
}

fn feature_controls(feature: Feature) -> String {
    match feature {
        Feature::RemoveBackground => r##"<details>
  <summary>Background Replacement Options</summary>
  <label>Custom Background Image (Optional) <input type="file" name="background_image" accept="image/*"></label>
  <label><input type="checkbox" name="use_color"> Custom Background Color (Optional)
    <input type="color" name="background_color" value="#ffffff"></label>
</details>"##
            .to_string(),
        Feature::Upscale => String::new(),
        Feature::BlurBackground => format!(
            r#"<label>Blur Radius Intensity <output>{default:.1}</output>
  <input type="range" name="intensity" min="{min}" max="{max}" step="{step}" value="{default:.1}"
    oninput="this.previousElementSibling.value = Number(this.value).toFixed(1)"></label>"#,
            min = BlurIntensity::MIN,
            max = BlurIntensity::MAX,
            step = BlurIntensity::STEP,
            default = BlurIntensity::DEFAULT
        ),
    }
}

fn button_label(feature: Feature) -> &'static str {
    match feature {
        Feature::RemoveBackground => "Remove Background",
        Feature::Upscale => "Upscale Image",
        Feature::BlurBackground => "Blur Background",
    }
}

fn api_path(feature: Feature) -> &'static str {
    match feature {
        Feature::RemoveBackground => "/api/remove-background",
        Feature::Upscale => "/api/upscale",
        Feature::BlurBackground => "/api/blur",
    }
}

fn tab_panel(catalog: &ExampleCatalog, feature: Feature, active: bool) -> String {
    format!(
        r#"<section class="tab-panel{active}" id="tab-{slug}">
  <form class="column" data-endpoint="{endpoint}">
    <label>Upload Image <input type="file" name="image" accept="image/*"></label>
    {controls}
    {examples}
    <button type="submit" class="button-gradient">{label}</button>
    <p class="error"></p>
  </form>
  <div class="column">
    <div class="compare">
      <img class="before" alt="Before">
      <img class="after" alt="After">
    </div>
    <input type="range" class="compare-slider" min="0" max="100" value="50" aria-label="Before and after comparison">
    <a class="download" download="{slug}.png" hidden>Download result</a>
    {signup}
  </div>
</section>"#,
        active = if active { " active" } else { "" },
        slug = feature.slug(),
        endpoint = api_path(feature),
        controls = feature_controls(feature),
        examples = examples_block(catalog, feature),
        label = button_label(feature),
        signup = signup_prompt(),
    )
}

const PAGE_SCRIPT: &str = r#"
document.querySelectorAll('.tab-button').forEach(button => {
  button.addEventListener('click', () => {
    document.querySelectorAll('.tab-button, .tab-panel').forEach(el => el.classList.remove('active'));
    button.classList.add('active');
    document.getElementById('tab-' + button.dataset.tab).classList.add('active');
  });
});
document.querySelectorAll('.tab-panel').forEach(panel => {
  const form = panel.querySelector('form');
  const error = panel.querySelector('.error');
  const before = panel.querySelector('.before');
  const after = panel.querySelector('.after');
  const download = panel.querySelector('.download');
  panel.querySelector('.compare-slider').addEventListener('input', e => {
    after.style.clipPath = 'inset(0 0 0 ' + e.target.value + '%)';
  });
  panel.querySelectorAll('.examples').forEach(examples => {
    examples.addEventListener('click', async e => {
      const img = e.target.closest('[data-example]');
      if (!img) return;
      const blob = await (await fetch(img.dataset.example)).blob();
      const transfer = new DataTransfer();
      transfer.items.add(new File([blob], img.alt, { type: blob.type }));
      form.querySelector('input[name=image]').files = transfer.files;
    });
  });
  panel.querySelectorAll('.gallery').forEach(gallery => {
    const pages = Number(gallery.dataset.pages);
    const show = async page => {
      const response = await fetch('/api/examples/' + gallery.dataset.feature + '?page=' + page);
      if (!response.ok) return;
      const body = await response.json();
      const examples = gallery.querySelector('.examples');
      examples.replaceChildren(...body.examples.map(example => {
        const img = document.createElement('img');
        img.src = '/examples/' + gallery.dataset.feature + '/' + encodeURIComponent(example.name);
        img.alt = example.name;
        img.dataset.example = img.src;
        return img;
      }));
      gallery.dataset.page = page;
      gallery.querySelector('.gallery-position').textContent = (page + 1) + ' / ' + pages;
      gallery.querySelector('.gallery-prev').disabled = page === 0;
      gallery.querySelector('.gallery-next').disabled = page + 1 >= pages;
    };
    const prev = gallery.querySelector('.gallery-prev');
    const next = gallery.querySelector('.gallery-next');
    if (prev) prev.addEventListener('click', () => show(Number(gallery.dataset.page) - 1));
    if (next) next.addEventListener('click', () => show(Number(gallery.dataset.page) + 1));
  });
  form.addEventListener('submit', async e => {
    e.preventDefault();
    error.textContent = '';
    const data = new FormData(form);
    const useColor = form.querySelector('input[name=use_color]');
    if (useColor && !useColor.checked) data.delete('background_color');
    data.delete('use_color');
    const button = form.querySelector('button');
    button.disabled = true;
    try {
      const response = await fetch(form.dataset.endpoint, { method: 'POST', body: data });
      const body = await response.json();
      if (!response.ok) { error.textContent = body.error; return; }
      before.src = body.original;
      after.src = body.processed;
      download.href = body.processed;
      download.hidden = false;
    } catch (err) {
      error.textContent = String(err);
    } finally {
      button.disabled = false;
    }
  });
});
"#;

/// Render the single page with one tab per feature
#[must_use]
pub fn render_page(catalog: &ExampleCatalog) -> String {
    let mut tabs = String::new();
    let mut panels = String::new();
    for (index, feature) in Feature::ALL.into_iter().enumerate() {
        let _ = write!(
            tabs,
            r#"<button class="tab-button{active}" data-tab="{slug}">{label}</button>"#,
            active = if index == 0 { " active" } else { "" },
            slug = feature.slug(),
            label = feature.label()
        );
        panels.push_str(&tab_panel(catalog, feature, index == 0));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<header>
  <h1>{title}</h1>
  <p>Choose from our AI image processing features!</p>
  {info}
</header>
<main>
  <nav class="tabs">{tabs}</nav>
  {panels}
</main>
{footer}
<script>{script}</script>
</body>
</html>"#,
        title = TITLE,
        info = company_info(),
        tabs = tabs,
        panels = panels,
        footer = footer(),
        script = PAGE_SCRIPT,
    )
}
