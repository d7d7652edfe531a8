//! Landing page and the JSON 404 fallback.

use axum::{
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};

use super::api::json_error;

// ── Root page ─────────────────────────────────────────────────────────────────

/// Static page at `/`: lists the tools from `/api/tools` and reports health.
const ROOT_INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Classroom Studio</title>
  <style>
    *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: system-ui, -apple-system, sans-serif;
      background: #0f0f0f; color: #e0e0e0;
      display: flex; align-items: center; justify-content: center;
      min-height: 100vh;
    }
    .card {
      max-width: 40rem; padding: 2rem 3rem;
      border: 1px solid #333; border-radius: 12px;
      background: #1a1a1a;
    }
    h1 { font-size: 1.5rem; margin-bottom: 0.5rem; text-align: center; }
    p  { font-size: 0.9rem; color: #888; margin-bottom: 1rem; text-align: center; }
    ul { list-style: none; }
    li { padding: 0.6rem 0; border-top: 1px solid #2a2a2a; font-size: 0.9rem; }
    li b { color: #c0c0e0; }
    code { color: #9a9ab8; font-size: 0.8rem; }
  </style>
</head>
<body>
  <div class="card">
    <h1>Classroom Studio</h1>
    <p id="health">Checking model&hellip;</p>
    <ul id="tools"></ul>
  </div>
  <script>
    fetch('/api/health').then(r => r.json()).then(h => {
      document.getElementById('health').textContent =
        `${h.provider} / ${h.model} ` + (h.llm_reachable ? 'is reachable' : 'is not reachable');
    });
    fetch('/api/tools').then(r => r.json()).then(tools => {
      const list = document.getElementById('tools');
      for (const t of tools) {
        const li = document.createElement('li');
        li.innerHTML = `<b></b> <code>POST /api/tools/${t.id}</code><br><span></span>`;
        li.querySelector('b').textContent = t.title;
        li.querySelector('span').textContent = t.description;
        list.appendChild(li);
      }
    });
  </script>
</body>
</html>
"#;

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /
pub(super) async fn root() -> Html<&'static str> {
    Html(ROOT_INDEX_HTML)
}

pub(super) async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        json_error("not_found", format!("no route for {}", uri.path())),
    )
        .into_response()
}
