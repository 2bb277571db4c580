//! Chromium driver over the Chrome `DevTools` Protocol.
//!
//! Only compiled with the `browser` feature. Elements found by queries are
//! tagged with a `data-attest-ref` attribute so later calls (fill, click,
//! scoped queries) can address them; the tags live until the next
//! navigation.

use crate::driver::{
    ConsoleMessage, DriverConfig, ElementHandle, NetworkActivity, Screenshot, SessionDriver,
};
use crate::locator::Selector;
use crate::result::{AttestError, AttestResult};
use async_trait::async_trait;
use base64::Engine as _;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, CaptureScreenshotParams,
    Viewport,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Attribute used to address elements returned by queries
const REF_ATTRIBUTE: &str = "data-attest-ref";

/// Installed in every document; buffers console output and page errors
const CONSOLE_HOOK: &str = r"(() => {
  if (window.__attestConsole) return;
  const log = window.__attestConsole = [];
  const show = a => { try { return typeof a === 'string' ? a : JSON.stringify(a); } catch (_) { return String(a); } };
  const wrap = (name, level) => {
    const original = console[name];
    console[name] = function (...args) {
      log.push({ level, text: args.map(show).join(' ') });
      return original.apply(this, args);
    };
  };
  wrap('log', 'info');
  wrap('info', 'info');
  wrap('warn', 'warning');
  wrap('error', 'error');
  window.addEventListener('error', e => log.push({ level: 'pageerror', text: String(e.message) }));
  window.addEventListener('unhandledrejection', e => log.push({ level: 'pageerror', text: String(e.reason) }));
})();";

/// Takes the buffered messages out of the current document
const DRAIN_CONSOLE: &str = "window.__attestConsole ? window.__attestConsole.splice(0) : []";

fn cdp_error(e: impl std::fmt::Display) -> AttestError {
    AttestError::driver(e.to_string())
}

#[derive(Debug, Deserialize)]
struct RawElement {
    id: String,
    tag: String,
    text: String,
    visible: bool,
    enabled: bool,
}

impl From<RawElement> for ElementHandle {
    fn from(raw: RawElement) -> Self {
        Self {
            id: raw.id,
            tag_name: raw.tag,
            text_content: (!raw.text.is_empty()).then_some(raw.text),
            visible: raw.visible,
            enabled: raw.enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawActivity {
    complete: bool,
    count: usize,
}

#[derive(Debug, Deserialize)]
struct PageSize {
    width: f64,
    height: f64,
}

fn ref_css(element: &ElementHandle) -> String {
    format!("[{REF_ATTRIBUTE}={:?}]", element.id)
}

/// Script returning tagged descriptions of `selector` matches below `root`
fn query_script(root: &str, selector: &Selector) -> String {
    format!(
        "(() => {{ \
            const root = {root}; \
            if (!root) return []; \
            window.__attestSeq = window.__attestSeq || 0; \
            return {query}.map(el => {{ \
                if (!el.hasAttribute('{REF_ATTRIBUTE}')) {{ \
                    el.setAttribute('{REF_ATTRIBUTE}', String(++window.__attestSeq)); \
                }} \
                const style = window.getComputedStyle(el); \
                const rect = el.getBoundingClientRect(); \
                return {{ \
                    id: el.getAttribute('{REF_ATTRIBUTE}'), \
                    tag: el.tagName.toLowerCase(), \
                    text: el.innerText || el.textContent || '', \
                    visible: style.display !== 'none' && style.visibility !== 'hidden' \
                        && (rect.width > 0 || rect.height > 0), \
                    enabled: !el.disabled \
                }}; \
            }}); \
        }})()",
        query = selector.to_query_all("root")
    )
}

/// Chromium page driven over CDP
#[derive(Debug)]
pub struct ChromiumDriver {
    browser: Arc<Mutex<Browser>>,
    page: Page,
    handler: tokio::task::JoinHandle<()>,
    /// Console messages of documents already navigated away from
    carried_console: Vec<ConsoleMessage>,
}

impl ChromiumDriver {
    /// Launch a browser and open a blank page
    ///
    /// # Errors
    ///
    /// `BrowserNotFound` when no executable can be located,
    /// `BrowserLaunch` for other launch failures.
    pub async fn launch(config: &DriverConfig) -> AttestResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height);
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.executable_path {
            builder = builder.chrome_executable(path);
        }
        if let Some(ref ua) = config.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }

        let cdp_config = builder.build().map_err(|message| {
            if message.contains("Could not auto detect") {
                AttestError::BrowserNotFound
            } else {
                AttestError::BrowserLaunch { message }
            }
        })?;

        info!(headless = config.headless, "Launching chromium");
        let (browser, mut handler) =
            Browser::launch(cdp_config)
                .await
                .map_err(|e| AttestError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AttestError::BrowserLaunch {
                message: e.to_string(),
            })?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(CONSOLE_HOOK))
            .await
            .map_err(cdp_error)?;

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            page,
            handler: handle,
            carried_console: Vec::new(),
        })
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(&self, script: String) -> AttestResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(cdp_error)?
            .into_value()
            .map_err(cdp_error)
    }

    async fn page_console(&self) -> AttestResult<Vec<ConsoleMessage>> {
        self.evaluate("window.__attestConsole || []".to_string()).await
    }

    /// Move the document's console buffer into `carried_console`; called
    /// before anything that may replace the document
    async fn drain_console(&mut self) {
        match self.evaluate::<Vec<ConsoleMessage>>(DRAIN_CONSOLE.to_string()).await {
            Ok(messages) => self.carried_console.extend(messages),
            Err(e) => debug!(error = %e, "Console buffer not drained"),
        }
    }
}

#[async_trait]
impl SessionDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> AttestResult<()> {
        self.drain_console().await;
        self.page
            .goto(url)
            .await
            .map_err(|e| AttestError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> AttestResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(cdp_error)?
            .unwrap_or_default())
    }

    async fn query_all(&self, selector: &Selector) -> AttestResult<Vec<ElementHandle>> {
        let raw: Vec<RawElement> = self.evaluate(query_script("document", selector)).await?;
        Ok(raw.into_iter().map(ElementHandle::from).collect())
    }

    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &Selector,
    ) -> AttestResult<Vec<ElementHandle>> {
        let root = format!("document.querySelector({:?})", ref_css(scope));
        let raw: Vec<RawElement> = self.evaluate(query_script(&root, selector)).await?;
        Ok(raw.into_iter().map(ElementHandle::from).collect())
    }

    async fn fill(&mut self, element: &ElementHandle, text: &str) -> AttestResult<()> {
        let css = ref_css(element);
        // clear through the native setter so framework-controlled inputs notice
        let clear = format!(
            "(() => {{ \
                const el = document.querySelector({css:?}); \
                if (!el) return false; \
                const desc = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value'); \
                if (desc && desc.set) {{ desc.set.call(el, ''); }} else {{ el.value = ''; }} \
                el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                return true; \
            }})()"
        );
        let present: bool = self.evaluate(clear).await?;
        if !present {
            return Err(AttestError::ElementNotFound { locator: css });
        }
        let handle = self.page.find_element(css).await.map_err(cdp_error)?;
        handle.click().await.map_err(cdp_error)?;
        handle.type_str(text).await.map_err(cdp_error)?;
        debug!(element = %element.id, "Filled element");
        Ok(())
    }

    async fn click(&mut self, element: &ElementHandle) -> AttestResult<()> {
        let handle = self
            .page
            .find_element(ref_css(element))
            .await
            .map_err(cdp_error)?;
        // a submit click can unload the document before the next read
        self.drain_console().await;
        handle.click().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn content(&self) -> AttestResult<String> {
        self.page.content().await.map_err(cdp_error)
    }

    async fn network_activity(&self) -> AttestResult<NetworkActivity> {
        let raw: RawActivity = self
            .evaluate(
                "({ complete: document.readyState === 'complete', \
                    count: performance.getEntriesByType('resource').length })"
                    .to_string(),
            )
            .await?;
        Ok(NetworkActivity {
            document_complete: raw.complete,
            resource_count: raw.count,
        })
    }

    async fn console_messages(&self) -> AttestResult<Vec<ConsoleMessage>> {
        let mut messages = self.carried_console.clone();
        messages.extend(self.page_console().await?);
        Ok(messages)
    }

    async fn screenshot(&self, full_page: bool) -> AttestResult<Screenshot> {
        let screenshot_error = |e: String| AttestError::Screenshot { message: e };
        let mut params = CaptureScreenshotParams::builder().format(CaptureScreenshotFormat::Png);
        if full_page {
            let size: PageSize = self
                .evaluate(
                    "({ width: document.documentElement.scrollWidth, \
                        height: document.documentElement.scrollHeight })"
                        .to_string(),
                )
                .await?;
            params = params.capture_beyond_viewport(true).clip(Viewport {
                x: 0.0,
                y: 0.0,
                width: size.width,
                height: size.height,
                scale: 1.0,
            });
        }
        let shot = self
            .page
            .execute(params.build())
            .await
            .map_err(|e| screenshot_error(e.to_string()))?;

        let data = base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(|e| screenshot_error(e.to_string()))?;
        Ok(Screenshot::new(data, full_page))
    }

    async fn close(&mut self) -> AttestResult<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(cdp_error)?;
        let _ = browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_css() {
        let element = ElementHandle::new("7", "input");
        assert_eq!(ref_css(&element), "[data-attest-ref=\"7\"]");
    }

    #[test]
    fn test_query_script_scopes_to_root() {
        let script = query_script("document.querySelector(\"x\")", &Selector::css("td"));
        assert!(script.contains("const root = document.querySelector(\"x\");"));
        assert!(script.contains("Array.from(root.querySelectorAll(\"td\"))"));
        assert!(script.contains(REF_ATTRIBUTE));
    }

    #[test]
    fn test_raw_element_conversion() {
        let raw: RawElement = serde_json::from_str(
            r#"{"id":"3","tag":"th","text":"","visible":true,"enabled":true}"#,
        )
        .unwrap();
        let handle = ElementHandle::from(raw);
        assert_eq!(handle.tag_name, "th");
        assert!(handle.text_content.is_none());
    }

    #[test]
    fn test_drain_keeps_hook_buffer() {
        // the hook pushes into the array it created, so draining must
        // empty that array in place rather than replace it
        assert!(CONSOLE_HOOK.contains("const log = window.__attestConsole = []"));
        assert!(DRAIN_CONSOLE.contains("__attestConsole.splice(0)"));
        assert!(!DRAIN_CONSOLE.contains("__attestConsole ="));
    }

    #[test]
    fn test_console_hook_levels_deserialize() {
        let messages: Vec<ConsoleMessage> = serde_json::from_str(
            r#"[{"level":"pageerror","text":"boom"},{"level":"warning","text":"w"}]"#,
        )
        .unwrap();
        assert!(messages[0].level.is_error());
        assert!(!messages[1].level.is_error());
    }
}
