//! A surface that draws nothing and logs what it would have drawn.

use std::time::Duration;

use tracing::{debug, trace};

use super::{RenderError, RenderSurface};

/// Tracks cursor position in memory and logs surface calls.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    position: Option<(i32, i32)>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last attached or updated position; `None` while detached.
    pub fn position(&self) -> Option<(i32, i32)> {
        self.position
    }
}

impl RenderSurface for HeadlessSurface {
    fn attach(&mut self, x: i32, y: i32) -> Result<(), RenderError> {
        debug!("cursor attached at ({x}, {y})");
        self.position = Some((x, y));
        Ok(())
    }

    fn update_position(&mut self, x: i32, y: i32) -> Result<(), RenderError> {
        match self.position.as_mut() {
            Some(pos) => {
                trace!("cursor -> ({x}, {y})");
                *pos = (x, y);
                Ok(())
            }
            None => Err(RenderError::Detached),
        }
    }

    fn animate_click(&mut self, duration: Duration) -> Result<(), RenderError> {
        let (x, y) = self.position.ok_or(RenderError::Detached)?;
        debug!("click animation at ({x}, {y}) for {duration:?}");
        Ok(())
    }

    fn detach(&mut self) {
        if self.position.take().is_some() {
            debug!("cursor detached");
        }
    }
}
