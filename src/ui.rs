use crate::view_state::{DEFAULT_YEAR, YEAR_OPTIONS};

pub fn render_index() -> String {
    let buttons: String = YEAR_OPTIONS
        .iter()
        .map(|year| {
            let active = if *year == DEFAULT_YEAR { " active" } else { "" };
            format!(r#"<button class="tab{active}" type="button" data-year="{year}">{year}</button>"#)
        })
        .collect();
    INDEX_HTML.replace("{{YEAR_BUTTONS}}", &buttons)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>City Wellbeing Dashboard</title>
  <script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #eef3f6;
      --bg-2: #c9dce6;
      --ink: #24313a;
      --accent: #e0714f;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #f4f7f9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(1180px, 100%);
      margin: 0 auto;
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(1.8rem, 3.5vw, 2.5rem);
      margin: 0;
    }

    .controls {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 16px;
    }

    select {
      font: inherit;
      padding: 10px 14px;
      border-radius: 999px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      min-width: 220px;
    }

    .tabs {
      display: flex;
      gap: 6px;
      padding: 6px;
      background: rgba(47, 72, 88, 0.08);
      border-radius: 999px;
    }

    .tab {
      appearance: none;
      background: transparent;
      border: none;
      border-radius: 999px;
      padding: 8px 14px;
      font: inherit;
      font-weight: 600;
      color: #6b645d;
      cursor: pointer;
    }

    .tab.active {
      background: white;
      color: var(--accent-2);
      box-shadow: 0 8px 16px rgba(47, 72, 88, 0.12);
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(480px, 1fr));
      gap: 16px;
    }

    .card {
      background: white;
      border-radius: 20px;
      padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      min-height: 200px;
    }

    .chart {
      width: 100%;
      height: 360px;
    }

    .card h2 {
      margin: 0 0 12px;
      font-size: 1.1rem;
    }

    .stat {
      display: grid;
      gap: 4px;
      margin-bottom: 12px;
    }

    .stat .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      font-size: 1.5rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .status {
      font-size: 0.95rem;
      min-height: 1.2em;
      color: #c63b2b;
    }

    @media (max-width: 600px) {
      .app {
        padding: 24px 18px;
      }
      .grid {
        grid-template-columns: 1fr;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header class="controls">
      <h1>City Wellbeing Dashboard</h1>
      <select id="city-select" aria-label="City">
        <option>Loading...</option>
      </select>
      <div class="tabs" role="tablist">{{YEAR_BUTTONS}}</div>
    </header>
    <div class="status" id="status"></div>
    <section class="grid">
      <div class="card">
        <h2 id="summary-title">Summary</h2>
        <div class="stat"><span class="label">Average suicide rate</span><span class="value" id="summary-rate">--</span></div>
        <div class="stat"><span class="label">Welfare spending per capita</span><span class="value" id="summary-welfare">--</span></div>
        <div class="stat"><span class="label">Nationwide average</span><span class="value" id="summary-nationwide">--</span></div>
      </div>
      <div class="card">
        <h2 id="details-title">City Details</h2>
        <div class="stat"><span class="label">Counseling centers</span><span class="value" id="details-centers">--</span></div>
        <div class="stat"><span class="label">Online centers</span><span class="value" id="details-online">--</span></div>
        <div class="stat"><span class="label">Population</span><span class="value" id="details-population">--</span></div>
        <div class="stat"><span class="label">Area (km&sup2;)</span><span class="value" id="details-area">--</span></div>
      </div>
      <div class="card"><div class="chart" id="gender_trend"></div></div>
      <div class="card"><div class="chart" id="welfare_trend"></div></div>
      <div class="card"><div class="chart" id="age_trend"></div></div>
      <div class="card"><div class="chart" id="resource_scatter"></div></div>
      <div class="card"><div class="chart" id="accessibility_map"></div></div>
    </section>
  </main>
  <script>
    const citySelect = document.getElementById('city-select');
    const statusEl = document.getElementById('status');
    const yearButtons = Array.from(document.querySelectorAll('.tab[data-year]'));

    const setStatus = (message) => {
      statusEl.textContent = message || '';
    };

    const setText = (id, value) => {
      document.getElementById(id).textContent = value == null ? '--' : value;
    };

    const toPlotlyTrace = (trace) => {
      switch (trace.type) {
        case 'line':
          return { type: 'scatter', mode: 'lines+markers', name: trace.name, x: trace.x, y: trace.y };
        case 'bar':
          return { type: 'bar', name: trace.name, x: trace.x, y: trace.y };
        case 'scatter':
          return { type: 'scatter', mode: 'markers', name: trace.name, x: trace.x, y: trace.y, text: trace.text };
        case 'geo':
          return {
            type: 'scattergeo',
            name: trace.name,
            lat: trace.lat,
            lon: trace.lon,
            text: trace.text,
            marker: {
              size: trace.size.map((v) => (v == null ? 6 : Math.max(6, Math.sqrt(v) * 3))),
              color: trace.highlight ? undefined : trace.color,
              symbol: trace.highlight ? 'star' : 'circle'
            }
          };
        default:
          return null;
      }
    };

    // The only place a chart description touches a chart surface.
    const applyChart = (id, chart) => {
      const traces = chart.traces.map(toPlotlyTrace).filter(Boolean);
      const layout = {
        title: chart.title,
        xaxis: { title: chart.layout.x_title || '' },
        yaxis: { title: chart.layout.y_title || '' },
        margin: { t: 48, r: 16, b: 48, l: 56 },
        annotations: chart.annotation
          ? [{ text: chart.annotation, showarrow: false, xref: 'paper', yref: 'paper', x: 0.5, y: 0.5 }]
          : []
      };
      if (id === 'accessibility_map') {
        layout.geo = { scope: 'asia', center: { lat: 23.7, lon: 121 }, projection: { scale: 14 } };
      }
      Plotly.react(id, traces, layout, { responsive: true });
    };

    const applyPanel = (kind, panel) => {
      if (panel.view === 'chart') {
        applyChart(kind, panel);
      } else if (panel.view === 'summary') {
        setText('summary-title', panel.title);
        setText('summary-rate', panel.average_rate_display);
        setText('summary-welfare', panel.welfare_spending);
        setText('summary-nationwide', panel.nationwide_spending);
      } else if (panel.view === 'details') {
        setText('details-title', panel.title);
        setText('details-centers', panel.center_number);
        setText('details-online', panel.online_center_number);
        setText('details-population', panel.population);
        setText('details-area', panel.area);
      }
    };

    const renderSnapshot = (snapshot) => {
      if (citySelect.dataset.loaded !== 'true' && snapshot.cities.length) {
        citySelect.innerHTML = '';
        snapshot.cities.forEach((city) => {
          const option = document.createElement('option');
          option.value = city.code;
          option.textContent = city.name;
          citySelect.appendChild(option);
        });
        citySelect.dataset.loaded = 'true';
      }
      if (snapshot.selected_city) {
        citySelect.value = snapshot.selected_city;
      }
      yearButtons.forEach((button) => {
        button.classList.toggle('active', Number(button.dataset.year) === snapshot.selected_year);
      });
      Object.entries(snapshot.panels).forEach(([kind, panel]) => applyPanel(kind, panel));
      setStatus(snapshot.status.message);
    };

    const loadDashboard = async () => {
      const res = await fetch('/api/dashboard');
      if (!res.ok) {
        throw new Error('Unable to load dashboard');
      }
      return res.json();
    };

    const select = async (path, body) => {
      const res = await fetch(path, {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify(body)
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      renderSnapshot(await res.json());
    };

    citySelect.addEventListener('change', () => {
      select('/api/select/city', { code: citySelect.value }).catch((err) => setStatus(err.message));
    });

    yearButtons.forEach((button) => {
      button.addEventListener('click', () => {
        select('/api/select/year', { year: Number(button.dataset.year) }).catch((err) => setStatus(err.message));
      });
    });

    // Startup runs in the background on the server; poll until every panel has rendered.
    const panelCount = document.querySelectorAll('.chart').length + 2;
    const boot = async (attempt = 0) => {
      const snapshot = await loadDashboard();
      renderSnapshot(snapshot);
      const pending = Object.keys(snapshot.panels).length < panelCount;
      if (pending && !snapshot.status.message && attempt < 30) {
        setTimeout(() => boot(attempt + 1).catch((err) => setStatus(err.message)), 500);
      }
    };

    boot().catch((err) => setStatus(err.message));
  </script>
</body>
</html>
"#;
