//! DOM geometry for CDP page session.

use serde_json::json;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::BoxModel;

use super::core::PageSession;

impl PageSession {
    /// Box model of the node behind a remote object. `None` when it has no layout.
    pub async fn get_box_model(&self, object_id: &str) -> Result<Option<BoxModel>, CdpError> {
        let result = self
            .call("DOM.getBoxModel", Some(json!({"objectId": object_id})))
            .await;

        match result {
            Ok(r) => {
                let model: BoxModel = serde_json::from_value(r["model"].clone())?;
                Ok(Some(model))
            }
            Err(CdpError::Protocol { code: -32000, ref message })
                if message.contains("Could not compute box model") =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Scroll the node behind a remote object into the viewport.
    pub async fn scroll_into_view(&self, object_id: &str) -> Result<(), CdpError> {
        self.call(
            "DOM.scrollIntoViewIfNeeded",
            Some(json!({"objectId": object_id})),
        )
        .await?;
        Ok(())
    }

    /// Calculate center point of a quad.
    pub(crate) fn quad_center(quad: &[f64]) -> (f64, f64) {
        if quad.len() >= 8 {
            let x = (quad[0] + quad[2] + quad[4] + quad[6]) / 4.0;
            let y = (quad[1] + quad[3] + quad[5] + quad[7]) / 4.0;
            (x, y)
        } else {
            (0.0, 0.0)
        }
    }
}
