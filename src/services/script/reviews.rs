use serde_json::json;

use super::{wrap, ScriptContext};
use crate::models::{ReviewsSettings, WidgetSize};
use crate::services::escape;

const REVIEWS_PER_PAGE: u32 = 5;

fn theme_hex(theme: &str) -> &'static str {
    match theme {
        "blue" => "#2563eb",
        "green" => "#16a34a",
        "purple" => "#9333ea",
        _ => "#0d9488",
    }
}

fn max_width(size: WidgetSize) -> u32 {
    match size {
        WidgetSize::Small => 384,
        WidgetSize::Medium => 448,
        WidgetSize::Large => 672,
    }
}

pub(super) fn render(id: &str, reviews: &ReviewsSettings, ctx: &ScriptContext) -> String {
    let base = ctx.base();
    let config = json!({
        "containerId": format!("google-reviews-{id}"),
        "reviewsUrl": format!("{base}/api/google/reviews?clientId={}", escape::url_component(id)),
        "photoUrl": format!("{base}/api/google/place-photo?maxwidth=100&photo_reference="),
        "mapsUrl": format!(
            "https://www.google.com/maps/place/?q=place_id:{}",
            escape::url_component(&reviews.place_id)
        ),
        "placeName": reviews.place_name,
        "accent": theme_hex(&reviews.theme_color),
        "themeClass": format!("grw-theme-{}", escape::css_ident(&reviews.theme_color)),
        "sizeClass": format!("grw-size-{}", reviews.widget_size.as_str()),
        "maxWidth": max_width(reviews.widget_size),
        "perPage": REVIEWS_PER_PAGE,
    });

    wrap("Google reviews widget", &config, RUNTIME)
}

const RUNTIME: &str = r##"
  var SORT_KEY = "grw-sort-" + CONFIG.containerId;

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

  function stars(rating) {
    var full = Math.round(Number(rating) || 0);
    var out = "";
    for (var i = 1; i <= 5; i++) {
      out += i <= full ? "★" : "☆";
    }
    return out;
  }

  function readSort() {
    try {
      return window.localStorage.getItem(SORT_KEY) || "newest";
    } catch (e) {
      return "newest";
    }
  }

  function writeSort(value) {
    try {
      window.localStorage.setItem(SORT_KEY, value);
    } catch (e) {}
  }

  function sortReviews(reviews, option) {
    var sorted = reviews.slice();
    sorted.sort(function (a, b) {
      switch (option) {
        case "highest":
          return (b.rating || 0) - (a.rating || 0);
        case "lowest":
          return (a.rating || 0) - (b.rating || 0);
        case "oldest":
          return (a.time || 0) - (b.time || 0);
        default:
          return (b.time || 0) - (a.time || 0);
      }
    });
    return sorted;
  }

  function container() {
    var host = document.getElementById(CONFIG.containerId);
    if (!host) {
      host = el("div");
      host.id = CONFIG.containerId;
      var current = document.currentScript;
      if (current && current.parentNode) {
        current.parentNode.insertBefore(host, current);
      } else {
        document.body.appendChild(host);
      }
    }
    host.className = "grw " + CONFIG.themeClass + " " + CONFIG.sizeClass;
    host.style.maxWidth = CONFIG.maxWidth + "px";
    host.style.fontFamily = "sans-serif";
    return host;
  }

  function message(host, text, color) {
    while (host.firstChild) {
      host.removeChild(host.firstChild);
    }
    host.appendChild(el("div", {
      padding: "16px",
      textAlign: "center",
      fontSize: "14px",
      color: color
    }, text));
  }

  function renderPlace(host, place) {
    while (host.firstChild) {
      host.removeChild(host.firstChild);
    }
    var card = el("div", {
      padding: "16px",
      background: "#ffffff",
      borderRadius: "12px",
      boxShadow: "0 1px 4px rgba(0, 0, 0, 0.12)",
      borderTop: "4px solid " + CONFIG.accent
    });

    var header = el("div", { display: "flex", alignItems: "center", marginBottom: "12px" });
    var photo = place.photos && place.photos[0] && place.photos[0].photo_reference;
    if (photo) {
      var img = el("img", {
        width: "56px",
        height: "56px",
        borderRadius: "8px",
        objectFit: "cover",
        marginRight: "12px"
      });
      img.alt = "";
      img.src = CONFIG.photoUrl + encodeURIComponent(photo);
      img.onerror = function () {
        img.style.display = "none";
      };
      header.appendChild(img);
    }
    var title = el("div", { flex: "1" });
    var name = el("a", {
      fontWeight: "600",
      fontSize: "16px",
      color: "#111827",
      textDecoration: "none"
    }, place.name || CONFIG.placeName);
    name.href = CONFIG.mapsUrl;
    name.target = "_blank";
    name.rel = "noopener noreferrer";
    title.appendChild(name);
    var rating = typeof place.rating === "number" ? place.rating.toFixed(1) : "N/A";
    title.appendChild(el("div", { color: "#f59e0b", fontSize: "14px" },
      stars(place.rating) + " " + rating + " • " + (place.user_ratings_total || 0) + " reviews"));
    if (place.formatted_address) {
      title.appendChild(el("div", { color: "#6b7280", fontSize: "12px" }, place.formatted_address));
    }
    header.appendChild(title);
    card.appendChild(header);

    var reviews = Array.isArray(place.reviews) ? place.reviews : [];
    var sortOption = readSort();
    var shown = CONFIG.perPage;

    var select = el("select", { fontSize: "12px", marginBottom: "8px" });
    [
      ["newest", "Newest First"],
      ["oldest", "Oldest First"],
      ["highest", "Highest Rated"],
      ["lowest", "Lowest Rated"]
    ].forEach(function (pair) {
      var option = el("option", null, pair[1]);
      option.value = pair[0];
      option.selected = pair[0] === sortOption;
      select.appendChild(option);
    });
    card.appendChild(select);

    var list = el("div");
    card.appendChild(list);

    var more = el("button", {
      display: "none",
      marginTop: "8px",
      padding: "6px 12px",
      border: "none",
      borderRadius: "6px",
      color: "#ffffff",
      cursor: "pointer",
      backgroundColor: CONFIG.accent
    }, "Load more");
    card.appendChild(more);

    function draw() {
      while (list.firstChild) {
        list.removeChild(list.firstChild);
      }
      if (reviews.length === 0) {
        list.appendChild(el("div", { color: "#6b7280", fontSize: "13px" }, "No reviews yet."));
      }
      sortReviews(reviews, sortOption).slice(0, shown).forEach(function (review) {
        var item = el("div", { borderTop: "1px solid #f3f4f6", padding: "8px 0" });
        var meta = el("div", { display: "flex", justifyContent: "space-between", fontSize: "13px" });
        meta.appendChild(el("span", { fontWeight: "600" }, review.author_name || "Anonymous"));
        meta.appendChild(el("span", { color: "#6b7280" }, review.relative_time_description || ""));
        item.appendChild(meta);
        item.appendChild(el("div", { color: "#f59e0b", fontSize: "13px" }, stars(review.rating)));
        item.appendChild(el("p", { margin: "4px 0 0", fontSize: "13px", color: "#374151" }, review.text || ""));
        list.appendChild(item);
      });
      more.style.display = shown < reviews.length ? "inline-block" : "none";
    }

    select.addEventListener("change", function () {
      sortOption = select.value;
      writeSort(sortOption);
      shown = CONFIG.perPage;
      draw();
    });
    more.addEventListener("click", function () {
      shown += CONFIG.perPage;
      draw();
    });

    draw();
    host.appendChild(card);
  }

  function fail(host, error) {
    if (window.console && console.error) {
      console.error("Google reviews widget error:", error);
    }
    if (host) {
      message(host, "Failed to load reviews", "#dc2626");
    }
  }

  function load(host) {
    message(host, "Loading reviews...", "#6b7280");
    fetch(CONFIG.reviewsUrl)
      .then(function (response) {
        return response.json().then(function (body) {
          if (!response.ok) {
            throw new Error(body && body.error ? body.error : "HTTP " + response.status);
          }
          return body;
        });
      })
      .then(function (body) {
        if (!body || !body.result) {
          message(host, "No place found. Please check the configuration.", "#6b7280");
          return;
        }
        renderPlace(host, body.result);
      })
      .catch(function (error) {
        fail(host, error);
      });
  }

  function start() {
    var host = null;
    try {
      host = container();
      load(host);
    } catch (error) {
      fail(host, error);
    }
  }

  if (document.readyState === "loading") {
    document.addEventListener("DOMContentLoaded", start);
  } else {
    start();
  }"##;
