// ── Configuration steps ──
//
// The fixed, dependency-ordered sequence pushed to the active firewall
// after HA pairing, plus the xpaths every part of the workflow writes to.

use strum::{Display, EnumIter};

use crate::config::Layout;
use crate::template::{TemplateError, TemplateKind, TemplateSet};

// ── XPaths ──────────────────────────────────────────────────────────

pub mod xpath {
    use crate::config::Layout;

    pub const DEVICE: &str = "/config/devices/entry[@name='localhost.localdomain']";

    pub fn ethernet() -> String {
        format!("{DEVICE}/network/interface/ethernet")
    }

    pub fn ethernet_entry(interface: &str) -> String {
        format!("{}/entry[@name='{interface}']", ethernet())
    }

    pub fn high_availability() -> String {
        format!("{DEVICE}/deviceconfig/high-availability")
    }

    pub fn ha_group() -> String {
        format!("{}/group", high_availability())
    }

    pub fn ha_interface() -> String {
        format!("{}/interface", high_availability())
    }

    pub fn vsys(layout: &Layout) -> String {
        format!("{DEVICE}/vsys/entry[@name='{}']", layout.vsys)
    }

    pub fn zones(layout: &Layout) -> String {
        format!("{}/zone", vsys(layout))
    }

    pub fn virtual_router(layout: &Layout) -> String {
        format!(
            "{DEVICE}/network/virtual-router/entry[@name='{}']",
            layout.virtual_router
        )
    }

    pub fn static_route(layout: &Layout) -> String {
        format!(
            "{}/routing-table/ip/static-route/entry[@name='{}']",
            virtual_router(layout),
            layout.static_route
        )
    }

    pub fn security_rules(layout: &Layout) -> String {
        format!("{}/rulebase/security/rules", vsys(layout))
    }

    pub fn nat_rules(layout: &Layout) -> String {
        format!("{}/rulebase/nat/rules", vsys(layout))
    }
}

// ── StepKind ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum StepKind {
    Interfaces,
    Zones,
    VirtualRouter,
    StaticRoutes,
    SecurityPolicy,
    SourceNat,
}

impl StepKind {
    /// Dependency order: objects referenced by later steps come first.
    pub const ORDER: [Self; 6] = [
        Self::Interfaces,
        Self::Zones,
        Self::VirtualRouter,
        Self::StaticRoutes,
        Self::SecurityPolicy,
        Self::SourceNat,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Interfaces => "interfaces",
            Self::Zones => "zones",
            Self::VirtualRouter => "virtual router",
            Self::StaticRoutes => "static routes",
            Self::SecurityPolicy => "security policy",
            Self::SourceNat => "source NAT",
        }
    }

    pub fn template(self) -> TemplateKind {
        match self {
            Self::Interfaces => TemplateKind::Interface,
            Self::Zones => TemplateKind::Zone,
            Self::VirtualRouter => TemplateKind::VirtualRouter,
            Self::StaticRoutes => TemplateKind::StaticRoute,
            Self::SecurityPolicy => TemplateKind::SecurityPolicy,
            Self::SourceNat => TemplateKind::SourceNat,
        }
    }

    pub fn xpath(self, layout: &Layout) -> String {
        match self {
            Self::Interfaces => xpath::ethernet(),
            Self::Zones => xpath::zones(layout),
            Self::VirtualRouter => xpath::virtual_router(layout),
            Self::StaticRoutes => xpath::static_route(layout),
            Self::SecurityPolicy => xpath::security_rules(layout),
            Self::SourceNat => xpath::nat_rules(layout),
        }
    }
}

// ── ConfigurationStep ───────────────────────────────────────────────

/// One `set` call in the configuration sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationStep {
    pub kind: StepKind,
    pub template: TemplateKind,
    pub xpath: String,
}

impl ConfigurationStep {
    pub fn name(&self) -> String {
        self.kind.to_string()
    }

    /// Placeholder names the step's template needs, in sorted order.
    pub fn parameters<'t>(&self, templates: &'t TemplateSet) -> Result<Vec<&'t str>, TemplateError> {
        Ok(templates.get(self.template)?.required_fields().collect())
    }
}

/// The full ordered sequence for `layout`.
pub fn plan(layout: &Layout) -> Vec<ConfigurationStep> {
    StepKind::ORDER
        .iter()
        .map(|&kind| ConfigurationStep {
            kind,
            template: kind.template(),
            xpath: kind.xpath(layout),
        })
        .collect()
}
