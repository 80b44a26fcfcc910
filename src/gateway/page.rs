//! Embedded chat page served at `/`.

/// Minimal single-file chat UI. Presentation only; all behavior lives behind
/// `POST /api/chat`.
pub const CHAT_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Dispute Assistant</title>
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <style>
    :root { font-family: system-ui, sans-serif; color: #111827; background: #f3f4f6; }
    body { margin: 0; min-height: 100vh; display: flex; align-items: center; justify-content: center; }
    .app { width: 100%; max-width: 720px; height: 80vh; background: #fff; border-radius: 12px;
           box-shadow: 0 20px 40px rgba(15, 23, 42, 0.15); display: flex; flex-direction: column; overflow: hidden; }
    .header { padding: 14px 20px; background: #0f172a; color: #f9fafb; font-weight: 600; }
    .chat { flex: 1; overflow-y: auto; padding: 16px 20px; background: #f9fafb; }
    .msg { margin-bottom: 10px; display: flex; }
    .msg.user { justify-content: flex-end; }
    .bubble { max-width: 80%; padding: 10px 12px; border-radius: 10px; font-size: 0.9rem; white-space: pre-wrap; }
    .msg.user .bubble { background: #2563eb; color: #f9fafb; }
    .msg.assistant .bubble { background: #e5e7eb; }
    form { display: flex; gap: 8px; padding: 12px 16px; border-top: 1px solid #e5e7eb; }
    textarea { flex: 1; resize: none; min-height: 44px; border-radius: 8px; border: 1px solid #d1d5db; padding: 8px; font: inherit; }
    button { border: none; border-radius: 8px; padding: 10px 20px; background: #2563eb; color: #f9fafb; cursor: pointer; }
    button:disabled { opacity: 0.5; cursor: default; }
  </style>
</head>
<body>
  <div class="app">
    <div class="header">Dispute Assistant</div>
    <div id="chat" class="chat"></div>
    <form id="form">
      <textarea id="input" placeholder="Explain your issue, e.g. 'I was charged twice at Store X for $45'"></textarea>
      <button type="submit" id="send">Send</button>
    </form>
  </div>
  <script>
    const chatEl = document.getElementById("chat");
    const formEl = document.getElementById("form");
    const inputEl = document.getElementById("input");
    const sendEl = document.getElementById("send");

    function addMessage(role, content) {
      const item = document.createElement("div");
      item.className = "msg " + (role === "user" ? "user" : "assistant");
      const bubble = document.createElement("div");
      bubble.className = "bubble";
      bubble.textContent = content;
      item.appendChild(bubble);
      chatEl.appendChild(item);
      chatEl.scrollTop = chatEl.scrollHeight;
    }

    async function sendMessage(content) {
      addMessage("user", content);
      sendEl.disabled = true;
      try {
        const res = await fetch("/api/chat", {
          method: "POST",
          headers: { "content-type": "application/json" },
          body: JSON.stringify({ message: content })
        });
        if (!res.ok) {
          const err = await res.json().catch(() => ({}));
          addMessage("assistant", "Error: " + (err.error || "Something went wrong."));
          return;
        }
        const data = await res.json();
        addMessage("assistant", data.reply || "[No reply received]");
      } catch (e) {
        addMessage("assistant", "Network error while contacting the assistant.");
      } finally {
        sendEl.disabled = false;
      }
    }

    formEl.addEventListener("submit", (e) => {
      e.preventDefault();
      const value = inputEl.value.trim();
      if (!value) return;
      inputEl.value = "";
      sendMessage(value);
    });

    addMessage(
      "assistant",
      "Hi! I can help you describe and organize a transaction dispute. Tell me what happened, including where you were charged, the amount, and what went wrong."
    );
  </script>
</body>
</html>
"#;
