//! Calendar collection extraction from PROPFIND responses.

use tracing::debug;
use url::Url;

use caldiff_core::{Calendar, ComponentKind};

use crate::error::DecodeResult;
use crate::href::resolve_href;
use crate::multistatus::{PropNode, decode_multistatus};

/// Extracts calendar collections from a PROPFIND multistatus body.
///
/// Records without a `200 OK` propstat are skipped: the resource simply has
/// no successfully returned properties. Collections that do not support
/// VEVENT are skipped as well, since the client cannot produce events for
/// them. Relative hrefs are resolved against `base_url` when one is given.
pub fn extract_calendars(xml: &str, base_url: Option<&Url>) -> DecodeResult<Vec<Calendar>> {
    let records = decode_multistatus(xml)?;

    let calendars = records
        .iter()
        .filter_map(|record| {
            let prop = record.ok_prop()?;

            let supported_components = supported_components(prop);
            if !supported_components.contains(&ComponentKind::Event) {
                debug!(href = %record.href, "skipping collection without VEVENT support");
                return None;
            }

            Some(Calendar {
                display_name: prop.child_text("displayname").unwrap_or_default().to_string(),
                url: resolve_href(base_url, &record.href),
                ctag: prop.child_text("getctag").map(str::to_string),
                color: prop.child_text("calendar-color").map(str::to_string),
                description: prop.child_text("calendar-description").map(str::to_string),
                supported_components,
            })
        })
        .collect();

    Ok(calendars)
}

/// Reads the `supported-calendar-component-set`, discarding unknown names.
fn supported_components(prop: &PropNode) -> Vec<ComponentKind> {
    prop.first("supported-calendar-component-set")
        .map(|set| {
            set.all("comp")
                .iter()
                .filter_map(|comp| comp.attr("name"))
                .filter_map(ComponentKind::from_name)
                .collect()
        })
        .unwrap_or_default()
}
