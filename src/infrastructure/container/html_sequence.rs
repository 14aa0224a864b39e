//! Self-contained HTML player over an image sequence

use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::fs;

use crate::domain::capture::CompressedFrame;

use super::image_sequence::{frames_dir, ImageSequenceWriter};

/// Writes frame images plus a page that replays them
#[derive(Debug, Clone)]
pub struct HtmlSequenceWriter {
    page: PathBuf,
    frame_rate: u32,
}

impl HtmlSequenceWriter {
    /// `page` is the `.html` output; images go to the sibling `_frames` dir
    pub fn new(page: impl Into<PathBuf>, frame_rate: u32) -> Self {
        Self {
            page: page.into(),
            frame_rate: frame_rate.max(1),
        }
    }

    pub async fn write(&self, title: &str, frames: &[CompressedFrame]) -> io::Result<PathBuf> {
        ImageSequenceWriter::new(frames_dir(&self.page), self.frame_rate)
            .write_frames(frames)
            .await?;
        if let Some(parent) = self.page.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.page, render_page(title, self.frame_rate, frames)).await?;
        Ok(self.page.clone())
    }

    pub fn page(&self) -> &Path {
        &self.page
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the player page with every frame inlined as a data URI
pub fn render_page(title: &str, frame_rate: u32, frames: &[CompressedFrame]) -> String {
    let sources = frames
        .iter()
        .map(|f| format!("\"data:{};base64,{}\"", f.format().mime_type(), STANDARD.encode(f.data())))
        .collect::<Vec<_>>()
        .join(",\n");
    let interval = 1000 / frame_rate.max(1);
    let last = frames.len().saturating_sub(1);
    let title = escape_html(title);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ background: #111; color: #eee; font-family: sans-serif; margin: 0; padding: 1rem; }}
#screen {{ max-width: 100%; display: block; margin: 0 auto 1rem; background: #000; }}
#controls {{ display: flex; gap: 1rem; align-items: center; justify-content: center; }}
#seek {{ flex: 1; max-width: 40rem; }}
</style>
</head>
<body>
<h1>{title}</h1>
<img id="screen" alt="recording frame">
<div id="controls">
<button id="toggle">Play</button>
<input id="seek" type="range" min="0" max="{last}" value="0">
<span id="counter">0 / {count}</span>
</div>
<script>
const frames = [
{sources}
];
const interval = {interval};
const screen = document.getElementById("screen");
const toggle = document.getElementById("toggle");
const seek = document.getElementById("seek");
const counter = document.getElementById("counter");
let current = 0;
let timer = null;

function show(index) {{
  if (frames.length === 0) return;
  current = index;
  screen.src = frames[current];
  seek.value = current;
  counter.textContent = (current + 1) + " / " + frames.length;
}}

function play() {{
  if (frames.length === 0) return;
  toggle.textContent = "Pause";
  timer = setInterval(() => show((current + 1) % frames.length), interval);
}}

function pause() {{
  toggle.textContent = "Play";
  clearInterval(timer);
  timer = null;
}}

toggle.addEventListener("click", () => (timer === null ? play() : pause()));
seek.addEventListener("input", () => {{
  pause();
  show(Number(seek.value));
}});

show(0);
</script>
</body>
</html>
"#,
        title = title,
        last = last,
        count = frames.len(),
        sources = sources,
        interval = interval,
    )
}
