use crate::models::{BetRecord, SummaryStats};

/// Yen amount with thousands separators, e.g. `-¥1,234`.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "¥0".to_string();
    }
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-¥{grouped}")
    } else {
        format!("¥{grouped}")
    }
}

pub fn format_percentage(value: f64) -> String {
    if !value.is_finite() {
        return "0.00%".to_string();
    }
    format!("{value:.2}%")
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_index(stats: &SummaryStats, records: &[BetRecord]) -> String {
    let net_class = if stats.net_profit < 0.0 { "value loss" } else { "value gain" };
    INDEX_HTML
        .replace("{{TOTAL_STAKE}}", &format_currency(stats.total_stake))
        .replace("{{TOTAL_PAYOUT}}", &format_currency(stats.total_payout))
        .replace("{{NET_CLASS}}", net_class)
        .replace("{{NET_PROFIT}}", &format_currency(stats.net_profit))
        .replace("{{RECOVERY_RATE}}", &format_percentage(stats.overall_recovery_rate))
        .replace("{{HIT_RATE}}", &format_percentage(stats.hit_rate))
        .replace("{{MAX_PAYOUT}}", &format_currency(stats.max_single_payout))
        .replace("{{ROWS}}", &render_rows(records))
}

fn render_rows(records: &[BetRecord]) -> String {
    if records.is_empty() {
        return r#"<tr><td colspan="7" class="empty">No bets logged yet.</td></tr>"#.to_string();
    }

    // Newest first, like the entries table in the dashboard.
    records
        .iter()
        .rev()
        .map(|record| {
            let profit = record.profit();
            format!(
                r#"<tr>
          <td>{date}</td>
          <td>{race}</td>
          <td class="num">{stake}</td>
          <td class="num">{payout}</td>
          <td class="num {class}">{profit}</td>
          <td class="num">{rate}</td>
          <td><form method="post" action="/entries/{id}/delete"><button class="btn-delete" type="submit">Delete</button></form></td>
        </tr>"#,
                date = escape_html(&record.date),
                race = escape_html(record.race_name.as_deref().unwrap_or("-")),
                stake = format_currency(record.stake),
                payout = record
                    .payout
                    .map(format_currency)
                    .unwrap_or_else(|| "-".to_string()),
                class = if profit < 0.0 { "loss" } else { "gain" },
                profit = format_currency(profit),
                rate = format_percentage(record.recovery_rate()),
                id = escape_html(&record.id),
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Bet Ledger</title>
  <style>
    :root {
      --bg: #eef2ec;
      --ink: #1f2a24;
      --muted: #6b7a70;
      --gain: #2d7a4b;
      --loss: #c63b2b;
      --accent: #2f5d46;
      --card: #ffffff;
      --line: rgba(31, 42, 36, 0.1);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", "Helvetica Neue", sans-serif;
      padding: 28px 16px 48px;
    }

    .app {
      width: min(980px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.8rem, 4vw, 2.4rem);
    }

    h2 {
      margin: 0;
      font-size: 1.2rem;
    }

    .subtitle {
      margin: 4px 0 0;
      color: var(--muted);
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(150px, 1fr));
      gap: 12px;
    }

    .stat,
    .card {
      background: var(--card);
      border-radius: 14px;
      border: 1px solid var(--line);
      padding: 16px;
    }

    .stat .label {
      display: block;
      font-size: 0.75rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .stat .value {
      display: block;
      margin-top: 6px;
      font-size: 1.4rem;
      font-weight: 600;
    }

    .gain {
      color: var(--gain);
    }

    .loss {
      color: var(--loss);
    }

    .entry-form {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(150px, 1fr));
      gap: 12px;
      align-items: end;
    }

    label {
      display: grid;
      gap: 4px;
      font-size: 0.85rem;
      color: var(--muted);
    }

    input {
      padding: 8px 10px;
      border-radius: 8px;
      border: 1px solid var(--line);
      font-size: 1rem;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 10px 16px;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    .btn-delete {
      padding: 4px 10px;
      font-size: 0.8rem;
      background: transparent;
      color: var(--loss);
      border: 1px solid var(--loss);
    }

    .chart-header {
      display: flex;
      flex-wrap: wrap;
      justify-content: space-between;
      gap: 12px;
      margin-bottom: 12px;
    }

    .tabs {
      display: flex;
      gap: 4px;
    }

    .tab {
      background: transparent;
      color: var(--muted);
      border: 1px solid var(--line);
    }

    .tab.active {
      background: var(--accent);
      color: white;
    }

    #chart {
      width: 100%;
      height: 260px;
      display: block;
    }

    .chart-line {
      fill: none;
      stroke: var(--accent);
      stroke-width: 2.5;
    }

    .chart-bar {
      fill: var(--accent);
    }

    .chart-grid {
      stroke: var(--line);
    }

    .chart-axis {
      stroke: rgba(31, 42, 36, 0.3);
      stroke-dasharray: 4 6;
    }

    .chart-label {
      fill: var(--muted);
      font-size: 11px;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.9rem;
    }

    th,
    td {
      text-align: left;
      padding: 8px 6px;
      border-bottom: 1px solid var(--line);
    }

    .num {
      text-align: right;
      font-variant-numeric: tabular-nums;
    }

    .empty {
      text-align: center;
      color: var(--muted);
    }

    .status[data-type="error"] {
      color: var(--loss);
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Bet Ledger</h1>
      <p class="subtitle">Log each race, then watch stake, payout and profit over time.</p>
    </header>

    <section class="panel">
      <div class="stat"><span class="label">Total stake</span><span class="value">{{TOTAL_STAKE}}</span></div>
      <div class="stat"><span class="label">Total payout</span><span class="value">{{TOTAL_PAYOUT}}</span></div>
      <div class="stat"><span class="label">Net profit</span><span class="{{NET_CLASS}}">{{NET_PROFIT}}</span></div>
      <div class="stat"><span class="label">Recovery rate</span><span class="value">{{RECOVERY_RATE}}</span></div>
      <div class="stat"><span class="label">Hit rate</span><span class="value">{{HIT_RATE}}</span></div>
      <div class="stat"><span class="label">Best payout</span><span class="value">{{MAX_PAYOUT}}</span></div>
    </section>

    <section class="card">
      <form class="entry-form" method="post" action="/entries">
        <label>Date<input type="date" name="date" required /></label>
        <label>Race<input type="text" name="race_name" placeholder="optional" /></label>
        <label>Stake<input type="number" name="stake" min="0" step="1" required /></label>
        <label>Payout<input type="number" name="payout" min="0" step="1" value="0" /></label>
        <button type="submit">Add bet</button>
      </form>
    </section>

    <section class="card">
      <div class="chart-header">
        <div>
          <h2 id="chart-title">Profit</h2>
          <p id="chart-subtitle" class="subtitle"></p>
        </div>
        <div class="tabs" role="tablist">
          <button class="tab mode active" type="button" data-mode="profit">Per period</button>
          <button class="tab mode" type="button" data-mode="cumulative">Cumulative</button>
          <button class="tab mode" type="button" data-mode="recovery">Recovery by race</button>
        </div>
        <div class="tabs" role="tablist">
          <button class="tab span active" type="button" data-granularity="daily">Daily</button>
          <button class="tab span" type="button" data-granularity="weekly">Weekly</button>
          <button class="tab span" type="button" data-granularity="monthly">Monthly</button>
        </div>
      </div>
      <svg id="chart" viewBox="0 0 600 260" aria-label="Profit chart" role="img"></svg>
      <div class="status" id="status"></div>
    </section>

    <section class="card">
      <h2>Entries</h2>
      <table>
        <thead>
          <tr><th>Date</th><th>Race</th><th class="num">Stake</th><th class="num">Payout</th><th class="num">Profit</th><th class="num">Recovery</th><th></th></tr>
        </thead>
        <tbody>
        {{ROWS}}
        </tbody>
      </table>
    </section>
  </main>

  <script>
    const chartEl = document.getElementById('chart');
    const titleEl = document.getElementById('chart-title');
    const subtitleEl = document.getElementById('chart-subtitle');
    const statusEl = document.getElementById('status');
    const modeTabs = Array.from(document.querySelectorAll('.tab.mode'));
    const spanTabs = Array.from(document.querySelectorAll('.tab.span'));

    const titles = {
      profit: ['Profit per period', 'Sum of payout minus stake in each period.'],
      cumulative: ['Cumulative profit', 'Running total at the end of each period.'],
      recovery: ['Recovery by race', 'Payout as a share of stake for the last 10 bets.']
    };

    let mode = 'profit';
    let granularity = 'daily';

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const escapeHtml = (value) =>
      String(value).replace(/[&<>"']/g, (ch) => ({
        '&': '&amp;',
        '<': '&lt;',
        '>': '&gt;',
        '"': '&quot;',
        "'": '&#39;'
      })[ch]);

    const axisValue = (value) => Math.round(value).toLocaleString('ja-JP');

    const frame = (values) => {
      let min = Math.min(0, ...values);
      let max = Math.max(0, ...values);
      if (min === max) {
        min -= 1;
        max += 1;
      }
      return { min, max, range: max - min };
    };

    const renderChart = (points, asBars) => {
      if (!points.length) {
        chartEl.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data yet</text>';
        return;
      }

      const width = 600;
      const height = 260;
      const padX = 52;
      const padY = 34;
      const top = 20;
      const { min, range } = frame(points.map((point) => point.value));
      const step = points.length > 1 ? (width - padX * 2) / (points.length - 1) : 0;
      const scaleY = (height - top - padY) / range;
      const x = (i) => padX + i * step;
      const y = (value) => height - padY - (value - min) * scaleY;

      let grid = '';
      for (let i = 0; i <= 4; i += 1) {
        const value = min + (range * i) / 4;
        grid += `<line class="chart-grid" x1="${padX}" y1="${y(value)}" x2="${width - padX}" y2="${y(value)}" />`;
        grid += `<text class="chart-label" x="${padX - 8}" y="${y(value) + 4}" text-anchor="end">${axisValue(value)}</text>`;
      }

      let body;
      if (asBars) {
        const barWidth = Math.max(6, Math.min(40, (width - padX * 2) / points.length - 6));
        body = points
          .map((point, i) => {
            const top = Math.min(y(point.value), y(0));
            const h = Math.abs(y(point.value) - y(0));
            return `<rect class="chart-bar" x="${x(i) - barWidth / 2}" y="${top}" width="${barWidth}" height="${h}" />`;
          })
          .join('');
      } else {
        const path = points
          .map((point, i) => `${i === 0 ? 'M' : 'L'} ${x(i).toFixed(2)} ${y(point.value).toFixed(2)}`)
          .join(' ');
        body = `<path class="chart-line" d="${path}" />`;
      }

      const every = Math.max(1, Math.ceil(points.length / 8));
      const labels = points
        .map((point, i) =>
          i % every === 0
            ? `<text class="chart-label" x="${x(i)}" y="${height - padY + 18}" text-anchor="middle">${escapeHtml(point.label)}</text>`
            : ''
        )
        .join('');

      chartEl.innerHTML = `${grid}<line class="chart-axis" x1="${padX}" y1="${y(0)}" x2="${width - padX}" y2="${y(0)}" />${body}${labels}`;
    };

    const load = async () => {
      const url = mode === 'recovery'
        ? '/api/series/recovery?limit=10'
        : `/api/series/${mode}?granularity=${granularity}`;
      const res = await fetch(url);
      if (!res.ok) {
        throw new Error('Unable to load chart data');
      }
      const points = await res.json();
      const [title, subtitle] = titles[mode];
      titleEl.textContent = title;
      subtitleEl.textContent = subtitle;
      renderChart(points, mode !== 'cumulative');
      setStatus('', '');
    };

    const activate = (tabs, current, key) => {
      tabs.forEach((button) => button.classList.toggle('active', button.dataset[key] === current));
    };

    modeTabs.forEach((button) => {
      button.addEventListener('click', () => {
        mode = button.dataset.mode;
        activate(modeTabs, mode, 'mode');
        load().catch((err) => setStatus(err.message, 'error'));
      });
    });

    spanTabs.forEach((button) => {
      button.addEventListener('click', () => {
        granularity = button.dataset.granularity;
        activate(spanTabs, granularity, 'granularity');
        load().catch((err) => setStatus(err.message, 'error'));
      });
    });

    load().catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(0.0), "¥0");
        assert_eq!(format_currency(999.0), "¥999");
        assert_eq!(format_currency(1234.0), "¥1,234");
        assert_eq!(format_currency(1_234_567.4), "¥1,234,567");
        assert_eq!(format_currency(-1500.0), "-¥1,500");
        assert_eq!(format_currency(f64::NAN), "¥0");
    }

    #[test]
    fn percentage_uses_two_decimals() {
        assert_eq!(format_percentage(71.428_571), "71.43%");
        assert_eq!(format_percentage(0.0), "0.00%");
        assert_eq!(format_percentage(f64::INFINITY), "0.00%");
    }

    #[test]
    fn index_escapes_race_names() {
        let records = vec![BetRecord {
            id: "abc".to_string(),
            date: "2024-05-26".to_string(),
            race_name: Some("<script>".to_string()),
            stake: 100.0,
            payout: Some(250.0),
        }];
        let html = render_index(&crate::stats::compute_summary(&records), &records);
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("/entries/abc/delete"));
        assert!(html.contains("¥150"));
        assert!(html.contains("250.00%"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn chart_script_escapes_point_labels() {
        assert!(INDEX_HTML.contains("const escapeHtml = (value) =>"));
        assert!(INDEX_HTML.contains("${escapeHtml(point.label)}"));
        assert!(!INDEX_HTML.contains("${point.label}"));
    }
}
