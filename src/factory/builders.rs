//! Builders for the built-in policy types

use std::sync::Arc;

use super::{resolve_policy, BuildContext, ConfigurationError, PolicyDescriptor};
use crate::exchange::KeyExpression;
use crate::policy::{
    FailoverPolicy, FailoverStart, PolicyKind, RandomPolicy, RoundRobinPolicy, SelectionPolicy,
    StickyPolicy, TopicPolicy, WeightedPolicy,
};

type Built = Result<Arc<dyn SelectionPolicy>, ConfigurationError>;

pub(super) fn round_robin(descriptor: &PolicyDescriptor, _ctx: &BuildContext<'_>) -> Built {
    descriptor.ensure_known(PolicyKind::RoundRobin.tag(), &[])?;
    Ok(Arc::new(RoundRobinPolicy::new()))
}

pub(super) fn random(descriptor: &PolicyDescriptor, _ctx: &BuildContext<'_>) -> Built {
    descriptor.ensure_known(PolicyKind::Random.tag(), &[])?;
    Ok(Arc::new(RandomPolicy::new()))
}

pub(super) fn topic(descriptor: &PolicyDescriptor, _ctx: &BuildContext<'_>) -> Built {
    descriptor.ensure_known(PolicyKind::Topic.tag(), &[])?;
    Ok(Arc::new(TopicPolicy::new()))
}

pub(super) fn sticky(descriptor: &PolicyDescriptor, ctx: &BuildContext<'_>) -> Built {
    let policy = PolicyKind::Sticky.tag();
    descriptor.ensure_known(policy, &["correlation_expression", "fallback"])?;

    let raw = descriptor
        .get_str(policy, "correlation_expression")?
        .ok_or_else(|| ConfigurationError::missing(policy, "correlation_expression"))?;
    let expression: KeyExpression = raw
        .parse()
        .map_err(|e: String| ConfigurationError::invalid(policy, "correlation_expression", e))?;

    let fallback_tag = descriptor
        .get_str(policy, "fallback")?
        .unwrap_or(PolicyKind::RoundRobin.tag());
    if let Ok(kind) = fallback_tag.parse::<PolicyKind>() {
        match kind {
            PolicyKind::Sticky | PolicyKind::Topic | PolicyKind::Failover => {
                return Err(ConfigurationError::invalid(
                    policy,
                    "fallback",
                    format!("'{}' cannot place new sticky keys", kind),
                ));
            }
            PolicyKind::Weighted | PolicyKind::Custom => {
                return Err(ConfigurationError::invalid(
                    policy,
                    "fallback",
                    format!("'{}' needs parameters a fallback tag cannot carry", kind),
                ));
            }
            _ => {}
        }
    }
    // Registered tags are built bare; a failure is reported against this field.
    let fallback = ctx
        .factory()
        .build_with(&PolicyDescriptor::new(fallback_tag), ctx)
        .map_err(|error| match error {
            ConfigurationError::UnknownPolicy { .. } => error,
            other => ConfigurationError::invalid(policy, "fallback", other.to_string()),
        })?;

    Ok(Arc::new(StickyPolicy::new(expression, fallback)))
}

pub(super) fn weighted(descriptor: &PolicyDescriptor, ctx: &BuildContext<'_>) -> Built {
    let policy = PolicyKind::Weighted.tag();
    descriptor.ensure_known(
        policy,
        &[
            "distribution_ratio",
            "distribution_ratio_delimiter",
            "round_robin",
        ],
    )?;

    let delimiter = descriptor
        .get_str(policy, "distribution_ratio_delimiter")?
        .unwrap_or(",");
    if delimiter.is_empty() {
        return Err(ConfigurationError::invalid(
            policy,
            "distribution_ratio_delimiter",
            "delimiter cannot be empty",
        ));
    }

    let ratios = descriptor
        .get_list(policy, "distribution_ratio", delimiter)?
        .ok_or_else(|| ConfigurationError::missing(policy, "distribution_ratio"))?;
    if ratios.is_empty() {
        return Err(ConfigurationError::invalid(
            policy,
            "distribution_ratio",
            "at least one weight is required",
        ));
    }

    let weights = ratios
        .iter()
        .map(|ratio| {
            ratio.parse::<u32>().map_err(|_| {
                ConfigurationError::invalid(
                    policy,
                    "distribution_ratio",
                    format!("'{}' is not a non-negative integer", ratio),
                )
            })
        })
        .collect::<Result<Vec<u32>, _>>()?;

    if let Some(destinations) = ctx.destination_count() {
        if destinations != weights.len() {
            return Err(ConfigurationError::WeightCountMismatch {
                policy: policy.to_string(),
                weights: weights.len(),
                destinations,
            });
        }
    }

    let round_robin = descriptor.get_bool(policy, "round_robin")?.unwrap_or(false);
    Ok(Arc::new(WeightedPolicy::new(weights, round_robin)?))
}

pub(super) fn failover(descriptor: &PolicyDescriptor, _ctx: &BuildContext<'_>) -> Built {
    let policy = PolicyKind::Failover.tag();
    descriptor.ensure_known(
        policy,
        &[
            "exceptions",
            "maximum_failover_attempts",
            "round_robin",
            "sticky",
        ],
    )?;

    let triggers = descriptor
        .get_list(policy, "exceptions", ",")?
        .unwrap_or_default();

    let maximum = match descriptor.get_int(policy, "maximum_failover_attempts")? {
        None | Some(-1) => None,
        Some(n) if n >= 0 => Some(n as usize),
        Some(n) => {
            return Err(ConfigurationError::invalid(
                policy,
                "maximum_failover_attempts",
                format!("{} is below -1", n),
            ))
        }
    };

    let round_robin = descriptor.get_bool(policy, "round_robin")?.unwrap_or(false);
    let sticky = descriptor.get_bool(policy, "sticky")?.unwrap_or(false);
    let start = if sticky {
        FailoverStart::Sticky
    } else if round_robin {
        FailoverStart::RoundRobin
    } else {
        FailoverStart::First
    };

    Ok(Arc::new(FailoverPolicy::new(triggers, maximum, start)))
}

pub(super) fn custom(descriptor: &PolicyDescriptor, ctx: &BuildContext<'_>) -> Built {
    let policy = PolicyKind::Custom.tag();
    descriptor.ensure_known(policy, &["ref"])?;

    if let Some(instance) = descriptor.instance() {
        return Ok(Arc::clone(instance));
    }

    let reference = descriptor
        .get_str(policy, "ref")?
        .ok_or_else(|| ConfigurationError::missing(policy, "ref"))?
        .trim();
    if reference.is_empty() {
        return Err(ConfigurationError::invalid(
            policy,
            "ref",
            "reference name cannot be empty",
        ));
    }

    resolve_policy(ctx.lookup(), reference).map_err(|source| ConfigurationError::Lookup {
        policy: policy.to_string(),
        source,
    })
}
