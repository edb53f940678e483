// View Loader - mounts a route's markup and style, then hands over to its page controller
//
// Ordering guaranteed on every navigation:
// 1. the previous style is detached before the new style is attached
// 2. the new style is attached before the markup is fetched
// 3. the mount point holds the new markup before the new page controller is initialized

use async_trait::async_trait;
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

/// Opaque reference to an attached style resource, issued by a [`Surface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StyleHandle(pub u64);

/// The rendering target the loader drives: one mount point and a style slot.
///
/// Implemented by each front-end (the slint window, or a test double).
pub trait Surface: Send {
    /// Whether the mount point exists. A missing one is a configuration error.
    fn has_mount_point(&self) -> bool;

    /// Attach the named style resource and return a handle for detaching it.
    fn attach_style(&mut self, locator: &str) -> StyleHandle;

    fn detach_style(&mut self, handle: StyleHandle);

    /// Replace the mount point's contents with `route`'s markup.
    fn replace_markup(&mut self, route: &str, markup: &str);

    /// Mark `route` as the active navigation entry. Cosmetic and idempotent.
    fn highlight_nav(&mut self, route: &str);
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Failed to read template {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where page markup comes from.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<String, TemplateError>;
}

/// Markup compiled into the binary, optionally overridden by files in a directory.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    embedded: IndexMap<String, String>,
    override_dir: Option<Utf8PathBuf>,
}

impl Templates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register built-in markup for `locator`
    pub fn with(mut self, locator: impl Into<String>, markup: impl Into<String>) -> Self {
        self.embedded.insert(locator.into(), markup.into());
        self
    }

    /// Look for `<dir>/<locator>` before falling back to built-in markup
    pub fn with_override_dir(mut self, dir: Option<Utf8PathBuf>) -> Self {
        self.override_dir = dir;
        self
    }
}

#[async_trait]
impl TemplateSource for Templates {
    async fn fetch(&self, locator: &str) -> Result<String, TemplateError> {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(locator);
            match tokio::fs::read_to_string(&path).await {
                Ok(markup) => {
                    tracing::debug!("Loaded template override {}", path);
                    return Ok(markup);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(TemplateError::Io {
                        locator: locator.to_string(),
                        source,
                    });
                }
            }
        }

        self.embedded
            .get(locator)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound(locator.to_string()))
    }
}

/// A mounted page's controller, as seen by the loader.
pub trait PageSession {
    /// Release everything the page holds. Called before the next page mounts.
    fn unmount(&mut self) {}
}

/// Builds the page controller for a freshly mounted route.
pub type PageInit<P> = Arc<dyn Fn() -> P + Send + Sync>;

/// One registered route: markup locator, style locator and page entry point.
pub struct Route<P> {
    pub path: String,
    pub template: String,
    pub stylesheet: String,
    init: PageInit<P>,
}

impl<P> Clone for Route<P> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            template: self.template.clone(),
            stylesheet: self.stylesheet.clone(),
            init: Arc::clone(&self.init),
        }
    }
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("No route registered for '{0}'")]
    UnknownRoute(String),

    #[error("Mount point is missing; cannot display '{0}'")]
    MountPointMissing(String),

    #[error("Failed to load markup for '{route}': {source}")]
    Template {
        route: String,
        #[source]
        source: TemplateError,
    },
}

/// Route table plus the single active page session.
///
/// Owns the surface's style slot exclusively: at most one style handle and one
/// page controller are live at any time.
pub struct Router<P, S, T> {
    routes: IndexMap<String, Route<P>>,
    redirects: IndexMap<String, String>,
    surface: S,
    templates: T,
    current_style: Option<StyleHandle>,
    active: Option<(String, P)>,
}

impl<P, S, T> Router<P, S, T>
where
    P: PageSession,
    S: Surface,
    T: TemplateSource,
{
    pub fn new(surface: S, templates: T) -> Self {
        Self {
            routes: IndexMap::new(),
            redirects: IndexMap::new(),
            surface,
            templates,
            current_style: None,
            active: None,
        }
    }

    /// Register a route. Re-registering a path replaces the previous entry.
    pub fn route<F>(
        mut self,
        path: impl Into<String>,
        template: impl Into<String>,
        stylesheet: impl Into<String>,
        init: F,
    ) -> Self
    where
        F: Fn() -> P + Send + Sync + 'static,
    {
        let path = path.into();
        self.routes.insert(
            path.clone(),
            Route {
                path,
                template: template.into(),
                stylesheet: stylesheet.into(),
                init: Arc::new(init),
            },
        );
        self
    }

    /// Send navigations for `from` to `to`
    pub fn redirect(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.redirects.insert(from.into(), to.into());
        self
    }

    /// Registered route paths, in registration order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    fn resolve(&self, path: &str) -> Result<Route<P>, LoaderError> {
        let target = self.redirects.get(path).map(String::as_str).unwrap_or(path);
        self.routes
            .get(target)
            .cloned()
            .ok_or_else(|| LoaderError::UnknownRoute(path.to_string()))
    }

    /// Mount the page registered for `path` and return the resolved route path.
    ///
    /// The previous style is detached and the new one attached before the
    /// markup fetch. If the fetch fails the previous route's style is put back
    /// and its page stays mounted. Navigating to the active route again
    /// remounts it from scratch.
    pub async fn navigate(&mut self, path: &str) -> Result<String, LoaderError> {
        let route = self.resolve(path)?;

        if !self.surface.has_mount_point() {
            tracing::error!("Cannot navigate to {}: mount point is missing", route.path);
            return Err(LoaderError::MountPointMissing(route.path));
        }

        if let Some(handle) = self.current_style.take() {
            self.surface.detach_style(handle);
        }
        self.current_style = Some(self.surface.attach_style(&route.stylesheet));

        let markup = match self.templates.fetch(&route.template).await {
            Ok(markup) => markup,
            Err(source) => {
                tracing::warn!("Keeping current page; {} has no markup: {}", route.path, source);
                self.restore_active_style();
                return Err(LoaderError::Template {
                    route: route.path,
                    source,
                });
            }
        };

        if let Some((previous, mut page)) = self.active.take() {
            tracing::debug!("Unmounting {}", previous);
            page.unmount();
        }

        self.surface.replace_markup(&route.path, &markup);

        let page = (route.init)();
        self.active = Some((route.path.clone(), page));

        self.surface.highlight_nav(&route.path);

        tracing::info!("Navigated to {}", route.path);
        Ok(route.path)
    }

    fn restore_active_style(&mut self) {
        if let Some(handle) = self.current_style.take() {
            self.surface.detach_style(handle);
        }
        let stylesheet = self
            .active
            .as_ref()
            .and_then(|(path, _)| self.routes.get(path))
            .map(|route| route.stylesheet.clone());
        if let Some(stylesheet) = stylesheet {
            self.current_style = Some(self.surface.attach_style(&stylesheet));
        }
    }

    /// Unmount the active page and detach its style.
    pub fn unmount(&mut self) {
        if let Some((path, mut page)) = self.active.take() {
            tracing::debug!("Unmounting {}", path);
            page.unmount();
        }
        if let Some(handle) = self.current_style.take() {
            self.surface.detach_style(handle);
        }
    }

    pub fn active_route(&self) -> Option<&str> {
        self.active.as_ref().map(|(path, _)| path.as_str())
    }

    pub fn active_page(&self) -> Option<&P> {
        self.active.as_ref().map(|(_, page)| page)
    }

    pub fn active_page_mut(&mut self) -> Option<&mut P> {
        self.active.as_mut().map(|(_, page)| page)
    }

    pub fn current_style(&self) -> Option<StyleHandle> {
        self.current_style
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
