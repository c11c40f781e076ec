use super::chapter::ChapterRef;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Receives page completions while a chapter downloads. Called concurrently
/// from every page of the chapter.
pub trait PageProgress: Send + Sync {
    fn start(&self, chapter: &ChapterRef, pages: usize);
    fn advance(&self);
    fn finish(&self, chapter: &ChapterRef);
}

/// One terminal bar per chapter.
pub struct BarProgress {
    multi_bar: MultiProgress,
    style: ProgressStyle,
    current: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> anyhow::Result<Self> {
        let style = ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} {msg}",
        )?;
        Ok(Self {
            multi_bar: MultiProgress::new(),
            style,
            current: Mutex::new(None),
        })
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(current) = self.current.lock() {
            if let Some(bar) = current.as_ref() {
                f(bar);
            }
        }
    }
}

impl PageProgress for BarProgress {
    fn start(&self, chapter: &ChapterRef, pages: usize) {
        let bar = self.multi_bar.add(
            ProgressBar::new(pages as u64)
                .with_message(format!("{} chapter {}", chapter.title, chapter.chapter))
                .with_style(self.style.clone()),
        );
        bar.inc(0);
        if let Ok(mut current) = self.current.lock() {
            *current = Some(bar);
        }
    }

    fn advance(&self) {
        self.with_bar(|bar| bar.inc(1));
    }

    fn finish(&self, chapter: &ChapterRef) {
        self.with_bar(|bar| {
            bar.finish_with_message(format!(
                "{} chapter {} downloaded",
                chapter.title, chapter.chapter
            ))
        });
    }
}
