use ted_database::Context;

use crate::options::UnitOverrides;

/// Target unit and flow per fully qualified variable.
///
/// Caller overrides take precedence over the registry default unit.
#[derive(Debug, Clone, Copy)]
pub struct UnitTargets<'a> {
    ctx: &'a Context,
    overrides: &'a UnitOverrides,
}

impl<'a> UnitTargets<'a> {
    pub fn new(ctx: &'a Context, overrides: &'a UnitOverrides) -> Self {
        Self { ctx, overrides }
    }

    pub fn unit(&self, variable: &str) -> Option<&'a str> {
        self.overrides
            .get(variable)
            .map(String::as_str)
            .or_else(|| self.ctx.registry.default_unit(variable))
    }

    pub fn flow(&self, variable: &str) -> Option<&'a str> {
        self.ctx.registry.flow_id(variable)
    }

    pub fn ctx(&self) -> &'a Context {
        self.ctx
    }
}
