//! Area selection state machine and the drawing-tool port it drives.

use geojson::Geometry;
use imap_core::{AreaDescriptor, AreaKind, PolygonGeometry, Rgb};
use log::{debug, info};

/// Stroke and fill of the polygon being drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawStyle {
    pub color: Rgb,
    pub weight: u32,
    pub fill_opacity: f32,
}

impl Default for DrawStyle {
    fn default() -> Self {
        DrawStyle {
            color: Rgb(0x3B82F6),
            weight: 3,
            fill_opacity: 0.2,
        }
    }
}

/// The external interactive drawing tool.
///
/// Its create, edit and delete events come back in through
/// [`AreaSelector::on_polygon_created`], [`AreaSelector::on_polygon_edited`]
/// and [`AreaSelector::on_polygon_deleted`].
pub trait DrawingTool: Send {
    /// Show the polygon edit controls.
    fn activate(&mut self, style: &DrawStyle);

    /// Hide the edit controls and remove any drawn shape.
    fn deactivate(&mut self);
}

/// What an event did to the area descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed,
    /// Valid in the current mode but left the descriptor as it was.
    Unchanged,
    /// Not valid in the current mode; dropped.
    Ignored,
}

impl Transition {
    pub fn is_changed(&self) -> bool {
        matches!(self, Transition::Changed)
    }
}

/// Holds the one live [`AreaDescriptor`] and keeps the drawing tool active
/// exactly while the mode is `Polygon`.
pub struct AreaSelector {
    descriptor: AreaDescriptor,
    tool: Box<dyn DrawingTool>,
    style: DrawStyle,
}

impl AreaSelector {
    pub fn new(tool: Box<dyn DrawingTool>) -> Self {
        Self {
            descriptor: AreaDescriptor::None,
            tool,
            style: DrawStyle::default(),
        }
    }

    pub fn with_style(mut self, style: DrawStyle) -> Self {
        self.style = style;
        self
    }

    pub fn descriptor(&self) -> &AreaDescriptor {
        &self.descriptor
    }

    pub fn kind(&self) -> AreaKind {
        self.descriptor.kind()
    }

    /// Switch to `kind` with no value. Choosing the current mode is a no-op;
    /// choosing `AreaKind::None` is [`AreaSelector::clear`].
    pub fn choose_mode(&mut self, kind: AreaKind) -> Transition {
        if kind == self.kind() {
            return Transition::Unchanged;
        }
        if kind == AreaKind::None {
            return self.clear();
        }

        self.leave_polygon_mode();
        self.descriptor = AreaDescriptor::empty(kind);
        if kind == AreaKind::Polygon {
            self.tool.activate(&self.style);
        }
        info!("Area mode set to {:?}", kind);
        Transition::Changed
    }

    /// Set the region name. An empty name counts as no selection.
    pub fn select_named_region(&mut self, name: Option<String>) -> Transition {
        let name = name.filter(|n| !n.trim().is_empty());
        match &mut self.descriptor {
            AreaDescriptor::NamedRegion(current) if *current == name => Transition::Unchanged,
            AreaDescriptor::NamedRegion(current) => {
                info!("Named region set to {:?}", name);
                *current = name;
                Transition::Changed
            }
            _ => {
                debug!("Ignoring region selection outside named-region mode");
                Transition::Ignored
            }
        }
    }

    /// Store a freshly drawn polygon, replacing any previous one.
    ///
    /// # Errors
    ///
    /// `Error::GeometryInvalid` if `geometry` is not a well-formed polygon; the
    /// previous geometry is kept.
    pub fn on_polygon_created(&mut self, geometry: Geometry) -> imap_core::Result<Transition> {
        self.store_polygon(geometry)
    }

    /// Replace the polygon in place after the user edited it.
    ///
    /// # Errors
    ///
    /// Same as [`AreaSelector::on_polygon_created`].
    pub fn on_polygon_edited(&mut self, geometry: Geometry) -> imap_core::Result<Transition> {
        self.store_polygon(geometry)
    }

    pub fn on_polygon_deleted(&mut self) -> Transition {
        match &mut self.descriptor {
            AreaDescriptor::Polygon(current @ Some(_)) => {
                *current = None;
                info!("Polygon deleted");
                Transition::Changed
            }
            AreaDescriptor::Polygon(None) => Transition::Unchanged,
            _ => {
                debug!("Ignoring polygon delete outside polygon mode");
                Transition::Ignored
            }
        }
    }

    /// Back to `None` from any state.
    pub fn clear(&mut self) -> Transition {
        if self.descriptor == AreaDescriptor::None {
            return Transition::Unchanged;
        }
        self.leave_polygon_mode();
        self.descriptor = AreaDescriptor::None;
        info!("Area cleared");
        Transition::Changed
    }

    fn store_polygon(&mut self, geometry: Geometry) -> imap_core::Result<Transition> {
        let AreaDescriptor::Polygon(current) = &mut self.descriptor else {
            debug!("Ignoring polygon event outside polygon mode");
            return Ok(Transition::Ignored);
        };
        let polygon = PolygonGeometry::try_from(geometry)?;
        if current.as_ref() == Some(&polygon) {
            return Ok(Transition::Unchanged);
        }
        *current = Some(polygon);
        Ok(Transition::Changed)
    }

    fn leave_polygon_mode(&mut self) {
        if self.kind() == AreaKind::Polygon {
            self.tool.deactivate();
        }
    }
}
