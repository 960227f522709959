use serde_json::json;

use super::{wrap, ScriptContext};
use crate::models::{absolutize, ChatSettings, WidgetSize};
use crate::services::escape;

const DEFAULT_AVATAR: &str = "https://cdn-icons-png.flaticon.com/512/3011/3011270.png";

fn popup_width(size: WidgetSize) -> u32 {
    match size {
        WidgetSize::Small => 300,
        WidgetSize::Medium => 360,
        WidgetSize::Large => 420,
    }
}

pub(super) fn render(id: &str, chat: &ChatSettings, ctx: &ScriptContext) -> String {
    let digits: String = chat.phone_number.chars().filter(char::is_ascii_digit).collect();
    let greeting_image = chat
        .greeting_image
        .as_deref()
        .map(|image| absolutize(ctx.base(), image))
        .unwrap_or_else(|| DEFAULT_AVATAR.to_string());

    let config = json!({
        "containerId": format!("whatsapp-widget-{id}"),
        "storageKey": format!("whatsapp-widget-messages-{id}"),
        "waUrl": format!("https://wa.me/{}", escape::url_component(&digits)),
        "themeColor": chat.theme_color,
        "popupWidth": popup_width(chat.widget_size),
        "right": chat.position.is_right(),
        "bottom": chat.position.is_bottom(),
        "agentName": chat.agent_name,
        "replyTime": chat.reply_time,
        "welcomeMessage": chat.welcome_message,
        "greetingMessage": chat.greeting_message,
        "greetingImage": greeting_image,
        "defaultImage": DEFAULT_AVATAR,
    });

    wrap("WhatsApp chat widget", &config, RUNTIME)
}

const RUNTIME: &str = r##"
  function el(tag, styles, text) {
    var node = document.createElement(tag);
    if (styles) {
      for (var key in styles) {
        node.style[key] = styles[key];
      }
    }
    if (text !== undefined && text !== null) {
      node.textContent = String(text);
    }
    return node;
  }

  function loadMessages() {
    try {
      var saved = JSON.parse(window.localStorage.getItem(CONFIG.storageKey) || "[]");
      return Array.isArray(saved) ? saved : [];
    } catch (e) {
      return [];
    }
  }

  function saveMessages(messages) {
    try {
      window.localStorage.setItem(CONFIG.storageKey, JSON.stringify(messages.slice(-50)));
    } catch (e) {}
  }

  function timestamp() {
    var now = new Date();
    var minutes = now.getMinutes();
    return now.getHours() + ":" + (minutes < 10 ? "0" + minutes : minutes);
  }

  function mount() {
    var host = document.getElementById(CONFIG.containerId);
    if (!host) {
      host = el("div");
      host.id = CONFIG.containerId;
      document.body.appendChild(host);
    }

    var side = CONFIG.right ? "right" : "left";
    var edge = CONFIG.bottom ? "bottom" : "top";

    var button = el("button", {
      position: "fixed",
      width: "60px",
      height: "60px",
      borderRadius: "50%",
      border: "none",
      cursor: "pointer",
      zIndex: "2147483000",
      backgroundColor: CONFIG.themeColor,
      boxShadow: "0 2px 10px rgba(0, 0, 0, 0.2)",
      color: "#ffffff",
      fontSize: "26px",
      fontFamily: "sans-serif"
    }, "✉");
    button.style[side] = "20px";
    button.style[edge] = "20px";
    button.setAttribute("aria-label", "Toggle WhatsApp chat");
    button.setAttribute("aria-expanded", "false");

    var popup = el("div", {
      position: "fixed",
      display: "none",
      flexDirection: "column",
      width: CONFIG.popupWidth + "px",
      maxWidth: "calc(100vw - 40px)",
      height: "420px",
      maxHeight: "calc(100vh - 120px)",
      background: "#ffffff",
      borderRadius: "12px",
      overflow: "hidden",
      zIndex: "2147483000",
      boxShadow: "0 8px 30px rgba(0, 0, 0, 0.25)",
      fontFamily: "sans-serif"
    });
    popup.style[side] = "20px";
    popup.style[edge] = "90px";
    popup.setAttribute("role", "dialog");

    var header = el("div", {
      display: "flex",
      alignItems: "center",
      padding: "12px",
      color: "#ffffff",
      backgroundColor: CONFIG.themeColor
    });
    var avatar = el("img", {
      width: "36px",
      height: "36px",
      borderRadius: "50%",
      marginRight: "10px",
      objectFit: "cover"
    });
    avatar.alt = "";
    avatar.src = CONFIG.greetingImage;
    avatar.onerror = function () {
      avatar.onerror = null;
      avatar.src = CONFIG.defaultImage;
    };
    var heading = el("div", { flex: "1", overflow: "hidden" });
    heading.appendChild(el("div", { fontWeight: "600", fontSize: "14px" }, CONFIG.agentName));
    heading.appendChild(el("div", { fontSize: "12px", opacity: "0.85" }, CONFIG.replyTime));
    var close = el("button", {
      background: "transparent",
      border: "none",
      color: "#ffffff",
      fontSize: "20px",
      cursor: "pointer"
    }, "×");
    close.setAttribute("aria-label", "Close WhatsApp chat");
    header.appendChild(avatar);
    header.appendChild(heading);
    header.appendChild(close);

    var area = el("div", {
      flex: "1",
      overflowY: "auto",
      padding: "10px",
      background: "#e5ddd5",
      display: "flex",
      flexDirection: "column"
    });
    area.setAttribute("role", "log");

    var inputRow = el("form", {
      display: "flex",
      padding: "8px",
      borderTop: "1px solid #e5e7eb",
      background: "#f9fafb"
    });
    var input = el("input", {
      flex: "1",
      border: "1px solid #d1d5db",
      borderRadius: "18px",
      padding: "8px 12px",
      fontSize: "14px",
      outline: "none"
    });
    input.type = "text";
    input.placeholder = "Type a message...";
    var send = el("button", {
      marginLeft: "8px",
      border: "none",
      borderRadius: "18px",
      padding: "0 14px",
      color: "#ffffff",
      cursor: "pointer",
      backgroundColor: CONFIG.themeColor
    }, "Send");
    send.type = "submit";
    inputRow.appendChild(input);
    inputRow.appendChild(send);

    popup.appendChild(header);
    popup.appendChild(area);
    popup.appendChild(inputRow);

    function bubble(message) {
      var outgoing = message.from === "visitor";
      var row = el("div", {
        alignSelf: outgoing ? "flex-end" : "flex-start",
        maxWidth: "80%",
        margin: "4px 0",
        padding: "6px 10px",
        borderRadius: "8px",
        fontSize: "14px",
        whiteSpace: "pre-wrap",
        wordBreak: "break-word",
        background: outgoing ? "#d9fdd3" : "#ffffff"
      }, message.text);
      row.appendChild(el("div", {
        fontSize: "10px",
        color: "#667781",
        textAlign: "right",
        marginTop: "2px"
      }, message.time));
      area.appendChild(row);
      area.scrollTop = area.scrollHeight;
    }

    var messages = loadMessages();
    if (messages.length === 0) {
      if (CONFIG.welcomeMessage) {
        messages.push({ from: "agent", text: CONFIG.welcomeMessage, time: timestamp() });
      }
      if (CONFIG.greetingMessage) {
        messages.push({ from: "agent", text: CONFIG.greetingMessage, time: timestamp() });
      }
      saveMessages(messages);
    }
    messages.forEach(bubble);

    function toggle(open) {
      popup.style.display = open ? "flex" : "none";
      button.setAttribute("aria-expanded", open ? "true" : "false");
      if (open) {
        input.focus();
      }
    }

    button.addEventListener("click", function () {
      toggle(popup.style.display === "none");
    });
    close.addEventListener("click", function () {
      toggle(false);
    });
    inputRow.addEventListener("submit", function (event) {
      event.preventDefault();
      var text = input.value.trim();
      if (!text) {
        return;
      }
      var message = { from: "visitor", text: text, time: timestamp() };
      messages.push(message);
      saveMessages(messages);
      bubble(message);
      input.value = "";
      window.open(CONFIG.waUrl + "?text=" + encodeURIComponent(text), "_blank", "noopener");
    });

    host.appendChild(button);
    host.appendChild(popup);
  }

  function fail(error) {
    if (window.console && console.error) {
      console.error("WhatsApp widget error:", error);
    }
    var host = document.getElementById(CONFIG.containerId);
    if (host) {
      host.textContent = "Failed to load chat";
    }
  }

  function start() {
    try {
      mount();
    } catch (error) {
      fail(error);
    }
  }

  if (document.readyState === "loading") {
    document.addEventListener("DOMContentLoaded", start);
  } else {
    start();
  }"##;
