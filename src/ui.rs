use crate::calendar::WEEKDAY_LABELS;

/// Form values the page opens with.
#[derive(Debug, Default)]
pub struct Prefill {
    pub name: String,
    pub month: String,
    pub auto_generate: bool,
}

pub fn render_index(prefill: &Prefill) -> String {
    let weekdays: String = WEEKDAY_LABELS
        .iter()
        .map(|label| format!(r#"<div class="weekday">{label}</div>"#))
        .collect();

    INDEX_HTML
        .replace("{{WEEKDAYS}}", &weekdays)
        .replace("{{NAME}}", &escape_html(&prefill.name))
        .replace("{{MONTH}}", &escape_html(&prefill.month))
        .replace("{{AUTO}}", if prefill.auto_generate { "true" } else { "false" })
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Attendance Calendar</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #eef6ea;
      --bg-2: #c9e4bf;
      --ink: #26302a;
      --accent: #2f8f46;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #f4fbef 60%, #fafdf8 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(1.8rem, 4vw, 2.6rem);
      margin: 0;
      color: var(--accent);
    }

    .form {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
      gap: 16px;
    }

    label {
      display: grid;
      gap: 6px;
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #6b7a70;
    }

    input {
      font: inherit;
      padding: 12px 14px;
      border-radius: 14px;
      border: 1px solid rgba(47, 72, 88, 0.18);
      background: white;
    }

    .actions {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 14px 20px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
    }

    button:disabled {
      opacity: 0.5;
      cursor: default;
    }

    .btn-generate {
      background: var(--accent);
      color: white;
    }

    .btn-save {
      background: var(--accent-2);
      color: white;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 6px;
      user-select: none;
      -webkit-user-select: none;
      touch-action: manipulation;
    }

    .weekday {
      background: var(--accent-2);
      color: white;
      border-radius: 10px;
      padding: 8px 0;
      text-align: center;
      font-weight: 600;
    }

    .day {
      min-height: 64px;
      border-radius: 12px;
      border: 1px solid rgba(47, 72, 88, 0.12);
      background: #f7f8f6;
      display: flex;
      flex-direction: column;
      align-items: center;
      justify-content: center;
      gap: 2px;
      padding: 4px;
      color: var(--ink);
      font-weight: 500;
    }

    .day.marked {
      background: #e4f5e0;
    }

    .day .tag {
      font-size: 0.7rem;
      color: var(--accent);
    }

    .tally {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(140px, 1fr));
      gap: 12px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 14px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 6px;
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

    .modal {
      position: fixed;
      inset: 0;
      background: rgba(0, 0, 0, 0.45);
      display: none;
      place-items: center;
      padding: 16px;
    }

    .modal.open {
      display: grid;
    }

    .modal .card {
      background: white;
      border-radius: 20px;
      padding: 24px;
      width: min(380px, 100%);
      display: grid;
      gap: 16px;
    }

    .modal .choice {
      display: flex;
      align-items: center;
      gap: 10px;
      text-transform: none;
      letter-spacing: normal;
      font-size: 1rem;
      color: var(--ink);
    }

    .modal .buttons {
      display: flex;
      justify-content: flex-end;
      gap: 10px;
    }

    .btn-cancel {
      background: #e8ebe7;
      color: var(--ink);
    }

    .status {
      font-size: 0.95rem;
      color: #6b645d;
      min-height: 1.2em;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="success"] {
      color: #2d7a4b;
    }

    .hidden {
      display: none;
    }

    @media (max-width: 600px) {
      .app {
        padding: 24px 16px;
      }
      .day {
        min-height: 48px;
        font-size: 0.85rem;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <h1>Attendance Calendar</h1>

    <section class="form">
      <label>Member name
        <input id="member-name" value="{{NAME}}" placeholder="Your name" />
      </label>
      <label>Target month
        <input id="target-month" type="month" value="{{MONTH}}" />
      </label>
    </section>

    <section class="actions">
      <button class="btn-generate" id="generate-btn" type="button">Generate calendar</button>
      <button class="btn-save" id="save-btn" type="button" disabled>Send monthly data</button>
    </section>

    <div class="status" id="status"></div>

    <section id="calendar-area" class="hidden">
      <div class="grid" id="grid">{{WEEKDAYS}}</div>
    </section>

    <section id="tally-area" class="tally hidden"></section>
    <p class="hint">Tap a day to cycle its status. Long-press or right-click to pick several.</p>
  </main>

  <div class="modal" id="editor">
    <div class="card">
      <h2 id="editor-title"></h2>
      <div id="editor-choices"></div>
      <div class="buttons">
        <button class="btn-cancel" id="editor-cancel" type="button">Cancel</button>
        <button class="btn-generate" id="editor-save" type="button">Save</button>
      </div>
    </div>
  </div>

  <script>
    const AUTO_GENERATE = {{AUTO}};
    const nameEl = document.getElementById('member-name');
    const monthEl = document.getElementById('target-month');
    const generateBtn = document.getElementById('generate-btn');
    const saveBtn = document.getElementById('save-btn');
    const statusEl = document.getElementById('status');
    const calendarArea = document.getElementById('calendar-area');
    const gridEl = document.getElementById('grid');
    const tallyEl = document.getElementById('tally-area');
    const editorEl = document.getElementById('editor');
    const editorTitle = document.getElementById('editor-title');
    const editorChoices = document.getElementById('editor-choices');
    const weekdayCells = Array.from(gridEl.children);

    let busy = false;
    let touching = false;
    let pressSeq = Date.now();
    let currentPress = null;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const request = async (path, body) => {
      const res = await fetch(path, {
        method: body === undefined ? 'GET' : 'POST',
        headers: { 'content-type': 'application/json' },
        body: body === undefined ? undefined : JSON.stringify(body)
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      return res.json();
    };

    const fail = (err) => setStatus(err.message, 'error');

    const stat = (label, value) => {
      const box = document.createElement('div');
      box.className = 'stat';
      const labelEl = document.createElement('span');
      labelEl.className = 'label';
      labelEl.textContent = label;
      const valueEl = document.createElement('span');
      valueEl.className = 'value';
      valueEl.textContent = String(value);
      box.append(labelEl, valueEl);
      return box;
    };

    const renderEditor = (editor) => {
      if (!editor) {
        editorEl.classList.remove('open');
        return;
      }
      editorTitle.textContent = `Statuses for day ${editor.day}`;
      editorChoices.replaceChildren();
      editor.choices.forEach((choice) => {
        const row = document.createElement('label');
        row.className = 'choice';
        const box = document.createElement('input');
        box.type = 'checkbox';
        box.checked = editor.selected.includes(choice);
        box.addEventListener('change', () => {
          request('/api/editor/toggle', { status: choice }).then(render).catch(fail);
        });
        row.appendChild(box);
        row.appendChild(document.createTextNode(choice));
        editorChoices.appendChild(row);
      });
      editorEl.classList.add('open');
    };

    const render = (view) => {
      saveBtn.disabled = busy || !view.generated;
      if (!view.generated) {
        calendarArea.classList.add('hidden');
        tallyEl.classList.add('hidden');
        renderEditor(null);
        return;
      }

      gridEl.replaceChildren(...weekdayCells);
      for (let i = 0; i < view.first_weekday; i += 1) {
        gridEl.appendChild(document.createElement('div'));
      }
      view.days.forEach((cell) => {
        const button = document.createElement('button');
        button.type = 'button';
        button.className = cell.statuses.length ? 'day marked' : 'day';
        button.dataset.day = String(cell.day);
        const number = document.createElement('span');
        number.textContent = String(cell.day);
        button.appendChild(number);
        cell.statuses.forEach((status) => {
          const tag = document.createElement('span');
          tag.className = 'tag';
          tag.textContent = status;
          button.appendChild(tag);
        });
        gridEl.appendChild(button);
      });
      calendarArea.classList.remove('hidden');

      if (view.member) {
        tallyEl.replaceChildren(
          stat(`${view.member}: total`, view.total_count),
          stat('Days attended', view.days_attended),
          ...view.status_counts.map((entry) => stat(entry.status, entry.count))
        );
        tallyEl.classList.remove('hidden');
      } else {
        tallyEl.classList.add('hidden');
      }

      renderEditor(view.editor);
    };

    const setBusy = (value) => {
      busy = value;
      generateBtn.disabled = value;
      generateBtn.textContent = value ? 'Working...' : 'Generate calendar';
    };

    const generate = async () => {
      setBusy(true);
      setStatus('Loading...', 'info');
      try {
        const data = await request('/api/calendar/generate', {
          name: nameEl.value,
          month: monthEl.value
        });
        setStatus(data.notice.message, data.notice.level);
        render(data.calendar);
      } catch (err) {
        fail(err);
        request('/api/calendar').then(render).catch(() => {});
      } finally {
        setBusy(false);
      }
    };

    const save = async () => {
      setBusy(true);
      setStatus('Sending...', 'info');
      try {
        const data = await request('/api/calendar/save', {
          name: nameEl.value,
          month: monthEl.value
        });
        setStatus(data.notice.message, data.notice.level);
      } catch (err) {
        fail(err);
      } finally {
        setBusy(false);
        saveBtn.disabled = false;
      }
    };

    const dayOf = (event) => {
      const target = event.target.closest('.day');
      return target ? Number(target.dataset.day) : null;
    };

    gridEl.addEventListener('click', (event) => {
      const day = dayOf(event);
      if (day === null || touching) {
        return;
      }
      request(`/api/days/${day}/tap`, {}).then(render).catch(fail);
    });

    gridEl.addEventListener('contextmenu', (event) => {
      const day = dayOf(event);
      if (day === null) {
        return;
      }
      event.preventDefault();
      request('/api/editor/open', { day }).then(render).catch(fail);
    });

    gridEl.addEventListener('touchstart', (event) => {
      const day = dayOf(event);
      if (day === null) {
        return;
      }
      touching = true;
      pressSeq += 1;
      currentPress = { press: pressSeq, day };
      request('/api/press/start', currentPress)
        .then((data) => {
          if (data.long_press) {
            render(data.calendar);
          }
        })
        .catch(fail);
    }, { passive: true });

    gridEl.addEventListener('touchmove', () => {
      if (touching && currentPress) {
        request('/api/press/move', { press: currentPress.press }).catch(fail);
      }
    }, { passive: true });

    gridEl.addEventListener('touchend', (event) => {
      if (!touching || !currentPress) {
        return;
      }
      event.preventDefault();
      const press = currentPress;
      currentPress = null;
      request('/api/press/end', press)
        .then((data) => render(data.calendar))
        .catch(fail)
        .finally(() => {
          touching = false;
        });
    });

    document.getElementById('editor-save').addEventListener('click', () => {
      request('/api/editor/save', {}).then(render).catch(fail);
    });

    document.getElementById('editor-cancel').addEventListener('click', () => {
      request('/api/editor/cancel', {}).then(render).catch(fail);
    });

    generateBtn.addEventListener('click', generate);
    saveBtn.addEventListener('click', save);

    request('/api/calendar').then(render).catch(fail);
    if (AUTO_GENERATE) {
      generate();
    }
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefill_is_escaped_into_the_form() {
        let page = render_index(&Prefill {
            name: "<Aki & \"Ren\">".to_string(),
            month: "2024-05".to_string(),
            auto_generate: true,
        });
        assert!(page.contains(r#"value="&lt;Aki &amp; &quot;Ren&quot;&gt;""#));
        assert!(page.contains(r#"value="2024-05""#));
        assert!(page.contains("const AUTO_GENERATE = true;"));
        assert!(page.contains(r#"<div class="weekday">Sun</div>"#));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn page_script_never_injects_markup_from_data() {
        let page = render_index(&Prefill::default());
        assert!(!page.contains("innerHTML"));
        assert!(page.contains("labelEl.textContent = label;"));
    }
}
