//! DOM-backed `Page` and `Mount`.

use std::rc::Rc;

use web_sys::{Document, DomParser, Element, SupportedType, Window};
use yroom_editor_core::{Mount, Page, PlatformError};

use crate::js_message;
use crate::platform::platform;

/// Wrapper element the serialized fragment is parsed inside, so text-only
/// and multi-root fragments still form one XML document.
const XML_ROOT: &str = "yroom-root";

/// The current browser page.
pub struct BrowserPage {
    window: Window,
    document: Document,
}

impl BrowserPage {
    pub fn new() -> Result<Self, PlatformError> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        Ok(Self { window, document })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn create_div(&self) -> Result<Element, PlatformError> {
        self.document
            .create_element("div")
            .map_err(|e| PlatformError(js_message(e)))
    }
}

impl Page for BrowserPage {
    fn host(&self) -> String {
        self.window.location().host().unwrap_or_default()
    }

    fn text_content(&self, element_id: &str) -> Option<String> {
        self.document
            .get_element_by_id(element_id)
            .and_then(|el| el.text_content())
    }

    fn append_container(
        &self,
        editor_id: &str,
        class: &str,
    ) -> Result<Rc<dyn Mount>, PlatformError> {
        let body = self.document.body().ok_or("no body")?;
        let container = self.create_div()?;
        let editor = self.create_div()?;
        editor.set_id(editor_id);
        editor.set_class_name(class);

        container
            .append_child(&editor)
            .map_err(|e| PlatformError(js_message(e)))?;
        body.append_child(&container)
            .map_err(|e| PlatformError(js_message(e)))?;

        tracing::debug!(editor_id, class, "appended editor container");
        Ok(Rc::new(ElementMount::owned(editor, container)))
    }

    fn query_mount(&self, selector: &str) -> Option<Rc<dyn Mount>> {
        match self.document.query_selector(selector) {
            Ok(Some(element)) => Some(Rc::new(ElementMount::existing(element))),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(selector, error = %js_message(e), "invalid mount selector");
                None
            }
        }
    }

    fn is_mac(&self) -> bool {
        platform().uses_cmd()
    }
}

/// An element an editor renders into.
///
/// `owner` is the container created for the editor, if any; it is removed
/// from the page on teardown. Elements the page already had are only
/// emptied.
pub struct ElementMount {
    element: Element,
    owner: Option<Element>,
}

impl ElementMount {
    pub fn existing(element: Element) -> Self {
        Self {
            element,
            owner: None,
        }
    }

    pub fn owned(element: Element, container: Element) -> Self {
        Self {
            element,
            owner: Some(container),
        }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    fn try_render(&self, xml: &str) -> Result<(), String> {
        let parser = DomParser::new().map_err(js_message)?;
        let parsed = parser
            .parse_from_string(&format!("<{XML_ROOT}>{xml}</{XML_ROOT}>"), SupportedType::TextXml)
            .map_err(js_message)?;
        if parsed.get_elements_by_tag_name("parsererror").length() > 0 {
            return Err("fragment is not well-formed".into());
        }
        let root = parsed.document_element().ok_or("empty document")?;

        self.element.set_text_content(None);
        while let Some(child) = root.first_child() {
            self.element.append_child(&child).map_err(js_message)?;
        }
        Ok(())
    }
}

impl Mount for ElementMount {
    fn element_id(&self) -> String {
        self.element.id()
    }

    fn render_xml(&self, xml: &str) {
        if let Err(reason) = self.try_render(xml) {
            // text only, never markup
            tracing::warn!(element = %self.element.id(), %reason, "rendering as text");
            self.element.set_text_content(Some(xml));
        }
    }

    fn remove(&self) {
        match &self.owner {
            Some(container) => container.remove(),
            None => self.element.set_text_content(None),
        }
    }
}
