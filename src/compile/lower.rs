//! Lowering turns the normalized tree into closures.
//!
//! Each [`Tree`] becomes a [`Unit`] that writes to a [`Pipe`], and each
//! [`Expression`] becomes an [`Eval`] that produces a [`Value`]. Helpers and
//! partials are looked up by name when the unit runs, so they may be added
//! to the engine after the template is compiled.
use crate::{
    compile::{
        tree::{Block, Call, Expression, Hash, Identifier, Output, Partial, Path, Tree},
        Scope,
    },
    helper::{Arguments, Helper, Options},
    log::{error_unknown_helper, error_unknown_partial, Error, INVALID_HELPER},
    pipe::{Escape, Pipe},
    region::Region,
    render::{is_truthy, Context, Locals, Renderer},
};
use serde_json::{Map, Value};
use std::{borrow::Cow, sync::Arc};
use tracing::trace;

/// One executable piece of a template.
pub type Unit = Box<dyn Fn(&Renderer, &Context, &mut Pipe) -> Result<(), Error> + Send + Sync>;

/// Produces the value of an expression.
pub type Eval = Box<
    dyn for<'c> Fn(&Renderer, &'c Context<'c>) -> Result<Cow<'c, Value>, Error> + Send + Sync,
>;

fn unit<F>(function: F) -> Unit
where
    F: Fn(&Renderer, &Context, &mut Pipe) -> Result<(), Error> + Send + Sync + 'static,
{
    Box::new(function)
}

fn eval<F>(function: F) -> Eval
where
    F: for<'c> Fn(&Renderer, &'c Context<'c>) -> Result<Cow<'c, Value>, Error>
        + Send
        + Sync
        + 'static,
{
    Box::new(function)
}

/// The template that units are lowered from, used to locate errors.
#[derive(Clone)]
struct Site {
    source: Arc<str>,
    name: Option<Arc<str>>,
}

impl Site {
    /// Point the [`Error`] at the given [`Region`], unless it already points
    /// somewhere, and name the template it comes from.
    fn locate(&self, error: Error, region: Region) -> Error {
        let error = error.or_pointer(&self.source, region);
        match &self.name {
            Some(name) if error.get_name().is_none() => error.with_name(name.as_ref()),
            _ => error,
        }
    }
}

/// Lower a normalized [`Scope`] into units.
pub fn lower(scope: Scope, source: Arc<str>, name: Option<Arc<str>>) -> Vec<Unit> {
    lower_scope(&Site { source, name }, scope)
}

fn lower_scope(site: &Site, scope: Scope) -> Vec<Unit> {
    scope
        .data
        .into_iter()
        .filter_map(|tree| lower_tree(site, tree))
        .collect()
}

fn lower_tree(site: &Site, tree: Tree) -> Option<Unit> {
    let unit = match tree {
        Tree::Raw(region) => {
            let text = site.source[region].to_owned();

            unit(move |_, _, pipe| Ok(pipe.write_safe(&text)?))
        }
        Tree::Comment(_) => return None,
        Tree::Output(output) => lower_output(site, output),
        Tree::Block(block) => lower_block(site, block),
        Tree::Partial(partial) => lower_partial(site, partial),
    };

    Some(unit)
}

fn lower_output(site: &Site, output: Output) -> Unit {
    let Output {
        expression,
        escape,
        region,
    } = output;
    let policy = move |pipe: &Pipe| if escape { pipe.escape() } else { Escape::None };

    match expression {
        Expression::Call(call) => {
            let call = lower_call(site, call);

            unit(move |renderer, context, pipe| {
                let escape = policy(pipe);

                call(renderer, context, &mut pipe.scoped(escape))
            })
        }
        Expression::Path(path) if path.helper_name().is_some() => {
            let site = site.clone();
            let name = path.text.clone();
            let value = lower_path(path);

            // {{name}} calls a helper when one is registered, or writes the value.
            unit(move |renderer, context, pipe| {
                let escape = policy(pipe);
                let mut pipe = pipe.scoped(escape);
                match renderer.engine().get_helper(&name) {
                    Some(Helper::Inline(helper)) => {
                        trace!(helper = name.as_str(), "calling inline helper");
                        helper(&mut pipe, context, &Arguments::default())
                            .map_err(|error| site.locate(error, region))
                    }
                    Some(Helper::Block(_)) => Err(site.locate(error_block_inline(&name), region)),
                    None => Ok(pipe.write_value(&value(renderer, context)?)?),
                }
            })
        }
        expression => {
            let value = lower_expression(site, expression);

            unit(move |renderer, context, pipe| {
                let value = value(renderer, context)?;
                let escape = policy(pipe);

                Ok(pipe.scoped(escape).write_value(&value)?)
            })
        }
    }
}

/// Lower a helper call into a [`Unit`] that writes the output of the helper.
fn lower_call(site: &Site, call: Call) -> Unit {
    let Call {
        name,
        arguments,
        hash,
        region,
    } = call;
    let arguments = ArgumentList::lower(site, arguments, hash);
    let site = site.clone();

    unit(move |renderer, context, pipe| {
        let arguments = arguments.evaluate(renderer, context)?;

        let result = match renderer.engine().get_helper(&name.name) {
            Some(Helper::Inline(helper)) => {
                trace!(helper = name.name.as_str(), "calling inline helper");
                helper(pipe, context, &arguments)
            }
            Some(Helper::Block(_)) => Err(error_block_inline(&name.name)),
            None => Err(error_unknown_helper(&site.source, name.region, &name.name)),
        };

        result.map_err(|error| site.locate(error, region))
    })
}

fn lower_expression(site: &Site, expression: Expression) -> Eval {
    match expression {
        Expression::Literal(literal) => {
            let value = literal.value;

            eval(move |_, _| Ok(Cow::Owned(value.clone())))
        }
        Expression::Path(path) => lower_path(path),
        Expression::Call(call) => {
            let call = lower_call(site, call);

            // A sub-expression is worth the text its helper writes.
            eval(move |renderer, context| {
                let mut buffer = String::new();
                call(renderer, context, &mut Pipe::new(&mut buffer, Escape::None))?;

                Ok(Cow::Owned(Value::String(buffer)))
            })
        }
        Expression::Truthy(inner) => {
            let inner = lower_expression(site, *inner);

            eval(move |renderer, context| {
                let value = inner(renderer, context)?;

                Ok(Cow::Owned(Value::Bool(is_truthy(&value))))
            })
        }
        Expression::Boolish(_) => {
            unreachable!("boolish expressions are removed before lowering")
        }
    }
}

/// Lower a [`Path`], missing values resolve to `null`.
fn lower_path(path: Path) -> Eval {
    let segments = path.segments;

    eval(move |_, context| {
        Ok(context
            .resolve(&segments)
            .unwrap_or(Cow::Owned(Value::Null)))
    })
}

fn lower_block(site: &Site, block: Block) -> Unit {
    let Block {
        name,
        arguments,
        hash,
        condition,
        template,
        inverse,
        region,
        close: _,
    } = block;
    let template = lower_scope(site, template);
    let inverse = lower_scope(site, inverse);
    let keyword = name.helper_name().map(str::to_owned);
    let mut arguments = arguments;

    match (keyword.as_deref(), condition) {
        (Some("if"), Some(condition)) => {
            let condition = lower_expression(site, condition);

            unit(move |renderer, context, pipe| {
                let value = condition(renderer, context)?;
                let units = if is_truthy(&value) { &template } else { &inverse };

                renderer.render_units(units, context, pipe)
            })
        }
        (Some("each"), _) if arguments.len() == 1 => {
            let target = lower_expression(site, arguments.remove(0));

            unit(move |renderer, context, pipe| {
                let value = target(renderer, context)?;
                if !iterate(renderer, &value, &template, context, pipe)? {
                    renderer.render_units(&inverse, context, pipe)?;
                }

                Ok(())
            })
        }
        (Some("with"), _) if arguments.len() == 1 => {
            let target = lower_expression(site, arguments.remove(0));

            unit(move |renderer, context, pipe| {
                let value = target(renderer, context)?;
                if is_truthy(&value) {
                    renderer.render_units(&template, &context.push(&value), pipe)
                } else {
                    renderer.render_units(&inverse, context, pipe)
                }
            })
        }
        (_, condition) => {
            let arguments = ArgumentList::lower(site, arguments, hash);
            let section = Section {
                value: lower_path(name.clone()),
                condition: condition.map(|condition| lower_expression(site, condition)),
            };

            lower_block_helper(site, name, arguments, section, region, template, inverse)
        }
    }
}

/// The value and condition of a block that may turn out to be a section.
struct Section {
    value: Eval,
    condition: Option<Eval>,
}

fn lower_block_helper(
    site: &Site,
    name: Path,
    arguments: ArgumentList,
    section: Section,
    region: Region,
    template: Vec<Unit>,
    inverse: Vec<Unit>,
) -> Unit {
    let site = site.clone();
    let helper_name = name.helper_name().map(str::to_owned);

    unit(move |renderer, context, pipe| {
        let helper = helper_name
            .as_deref()
            .and_then(|helper_name| renderer.engine().get_helper(helper_name));

        match helper {
            Some(Helper::Block(helper)) => {
                trace!(helper = name.text.as_str(), "calling block helper");
                let arguments = arguments.evaluate(renderer, context)?;
                let options = Options::new(renderer, &template, &inverse);

                helper(pipe, &options, context, &arguments)
                    .map_err(|error| site.locate(error, region))
            }
            Some(Helper::Inline(_)) => Err(site.locate(
                Error::build(INVALID_HELPER).with_help(format!(
                    "`{}` is an inline helper, call it with `{{{{{0} ...}}}}` instead of a block",
                    name.text
                )),
                name.region,
            )),
            None if !arguments.is_empty() => Err(site.locate(
                error_unknown_helper(&site.source, name.region, &name.text),
                region,
            )),
            None => {
                let value = (section.value)(renderer, context)?;
                let truthy = match &section.condition {
                    Some(condition) => is_truthy(&condition(renderer, context)?),
                    None => is_truthy(&value),
                };
                if !truthy {
                    return renderer.render_units(&inverse, context, pipe);
                }

                match &*value {
                    Value::Array(_) => iterate(renderer, &value, &template, context, pipe).map(|_| ()),
                    Value::Bool(true) => renderer.render_units(&template, context, pipe),
                    other => renderer.render_units(&template, &context.push(other), pipe),
                }
            }
        }
    })
}

/// Render the units once for every item of an array or member of an object.
///
/// Returns false when there was nothing to iterate.
fn iterate(
    renderer: &Renderer,
    value: &Value,
    units: &[Unit],
    context: &Context,
    pipe: &mut Pipe,
) -> Result<bool, Error> {
    match value {
        Value::Array(items) => {
            let last = items.len().saturating_sub(1);
            for (index, item) in items.iter().enumerate() {
                let frame = context.push(item).with_locals(Locals {
                    index,
                    key: None,
                    first: index == 0,
                    last: index == last,
                });
                renderer.render_units(units, &frame, pipe)?;
            }

            Ok(!items.is_empty())
        }
        Value::Object(members) => {
            let last = members.len().saturating_sub(1);
            for (index, (key, item)) in members.iter().enumerate() {
                let frame = context.push(item).with_locals(Locals {
                    index,
                    key: Some(key.clone()),
                    first: index == 0,
                    last: index == last,
                });
                renderer.render_units(units, &frame, pipe)?;
            }

            Ok(!members.is_empty())
        }
        _ => Ok(false),
    }
}

fn lower_partial(site: &Site, partial: Partial) -> Unit {
    let Partial {
        name,
        context: explicit,
        hash,
        region,
    } = partial;
    let explicit = explicit.map(|explicit| lower_expression(site, explicit));
    let hash = lower_hash(site, hash);
    let site = site.clone();

    unit(move |renderer, context, pipe| {
        let Some(template) = renderer.engine().get_partial(&name) else {
            return Err(site.locate(error_unknown_partial(&site.source, region, &name), region));
        };

        let result = if explicit.is_none() && hash.is_empty() {
            renderer.render_partial(&name, template, context, pipe)
        } else {
            let base = match &explicit {
                Some(explicit) => explicit(renderer, context)?,
                None => Cow::Borrowed(context.value()),
            };
            let value = if hash.is_empty() {
                base
            } else {
                // Hash pairs are merged over the context object.
                let mut members = match base.into_owned() {
                    Value::Object(members) => members,
                    _ => Map::new(),
                };
                for (key, value) in &hash {
                    members.insert(key.clone(), value(renderer, context)?.into_owned());
                }
                Cow::Owned(Value::Object(members))
            };

            renderer.render_partial(&name, template, &context.push(&value), pipe)
        };

        result.map_err(|error| site.locate(error, region))
    })
}

/// The lowered arguments of a helper call.
struct ArgumentList {
    positional: Vec<Eval>,
    hash: Vec<(String, Eval)>,
}

impl ArgumentList {
    fn lower(site: &Site, arguments: Vec<Expression>, hash: Hash) -> Self {
        Self {
            positional: arguments
                .into_iter()
                .map(|argument| lower_expression(site, argument))
                .collect(),
            hash: lower_hash(site, hash),
        }
    }

    fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.hash.is_empty()
    }

    /// Evaluate every argument from left to right.
    fn evaluate(&self, renderer: &Renderer, context: &Context) -> Result<Arguments, Error> {
        let values = self
            .positional
            .iter()
            .map(|argument| argument(renderer, context).map(Cow::into_owned))
            .collect::<Result<Vec<_>, _>>()?;

        let hash = if self.hash.is_empty() {
            None
        } else {
            let mut members = Map::new();
            for (key, value) in &self.hash {
                members.insert(key.clone(), value(renderer, context)?.into_owned());
            }
            Some(members)
        };

        Ok(Arguments::new(values, hash))
    }
}

fn lower_hash(site: &Site, hash: Hash) -> Vec<(String, Eval)> {
    hash.pairs
        .into_iter()
        .map(|(Identifier { name, .. }, value)| (name, lower_expression(site, value)))
        .collect()
}

/// Return an [`Error`] explaining that a block helper was called inline.
fn error_block_inline(name: &str) -> Error {
    Error::build(INVALID_HELPER).with_help(format!(
        "`{name}` is a block helper, open it with `{{{{#{name}}}}}` and close it with `{{{{/{name}}}}}`"
    ))
}
