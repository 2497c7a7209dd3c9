//! Signing page: show the design and place one signer's signature on it.

use crate::binding::{SignaturePlacement, place_signature};
use crate::bridge::BridgeError;
use crate::notify::{Notice, Notifier};
use crate::scaling::{Resize, ResponsiveView};
use crate::scene::Scene;
use kurbo::{Rect, Size};

pub struct SignatureSession {
    signer_id: String,
    view: ResponsiveView,
    /// Scaled scene with the signer's block hidden.
    scene: Option<Scene>,
    placement: Option<SignaturePlacement>,
    notifier: Box<dyn Notifier>,
}

impl SignatureSession {
    pub fn new(
        canonical_json: impl Into<String>,
        signer_id: impl Into<String>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            signer_id: signer_id.into(),
            view: ResponsiveView::new(canonical_json),
            scene: None,
            placement: None,
            notifier,
        }
    }

    pub fn signer_id(&self) -> &str {
        &self.signer_id
    }

    /// Rescale and recompute the overlay. The overlay is in the same
    /// coordinates as the scaled scene.
    pub fn resize(&mut self, container: Size) -> Result<Resize, BridgeError> {
        let resize = match self.view.resize(container) {
            Ok(resize) => resize,
            Err(e) => {
                log::error!("Failed to lay out signing view: {e}");
                self.notifier
                    .notify(Notice::error(format!("Failed to load design: {e}")));
                return Err(e);
            }
        };
        if let (Resize::Applied(fit), Some(scaled)) = (resize, self.view.scene()) {
            let mut scene = scaled.clone();
            let placement = place_signature(&mut scene, &self.signer_id, fit.render_size());
            self.scene = Some(scene);
            self.placement = Some(placement);
        }
        Ok(resize)
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn placement(&self) -> Option<&SignaturePlacement> {
        self.placement.as_ref()
    }

    /// Where to draw the signature image.
    pub fn overlay(&self) -> Option<Rect> {
        self.placement.as_ref().map(|p| p.overlay)
    }
}
