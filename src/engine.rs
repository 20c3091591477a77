use crate::{
    compile::{compile_with, syntax::Builder, Template},
    helper::{builtins, Arguments, Helper, Options},
    log::{Error, RESERVED_HELPER, UNSERIALIZABLE},
    pipe::{Escape, Pipe},
    render::{Context, Renderer},
};
use morel::Finder;
use serde::Serialize;
use serde_json::{to_value, Value};
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
};
use tracing::debug;

/// Names of the blocks implemented by the engine itself.
const RESERVED: [&str; 4] = ["if", "unless", "each", "with"];

/// Partials may be nested this deep unless the engine is told otherwise.
const DEFAULT_DEPTH: usize = 64;

/// Facilitates compiling and rendering templates, and provides storage
/// for helpers and partials.
///
/// Helpers and partials are looked up when a template is rendered, so they
/// may be added after the templates that use them are compiled. Adding a
/// helper or partial under a name that already exists replaces it.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use whisker::Engine;
///
/// let engine = Engine::default()
///     .with_partial("user", "<b>{{ name }}</b>")
///     .unwrap();
///
/// let template = engine.compile("{{#each users}}{{> user}}{{/each}}").unwrap();
/// let output = engine.render(&template, &json!({"users": [{"name": "ada"}, {"name": "bo"}]}));
///
/// assert_eq!(output.unwrap(), "<b>ada</b><b>bo</b>");
/// ```
pub struct Engine {
    /// Searches template text for the markers of the engine syntax.
    finder: Finder,
    /// Helpers that this engine is aware of.
    helpers: HashMap<String, Helper>,
    /// Partials that this engine is aware of.
    partials: HashMap<String, Template>,
    /// Escaping applied to `{{ }}` output.
    escape: Escape,
    /// How deep partials may be nested.
    depth: usize,
}

impl Engine {
    /// Create a new instance of [`Engine`] with the syntax described by the
    /// given [`Builder`].
    ///
    /// The built-in `lookup` and `log` helpers are registered.
    pub fn new(builder: Builder) -> Self {
        Self {
            finder: Finder::new(builder.to_syntax()),
            helpers: builtins()
                .into_iter()
                .map(|(name, helper)| (name.to_owned(), helper))
                .collect(),
            partials: HashMap::new(),
            escape: Escape::default(),
            depth: DEFAULT_DEPTH,
        }
    }

    /// Compile a new [`Template`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when compilation fails, which most likely means the source
    /// contains invalid syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use whisker::Engine;
    ///
    /// let engine = Engine::default();
    /// let template = engine.compile("hello, {{ name }}!");
    /// assert!(template.is_ok());
    /// ```
    #[inline]
    pub fn compile(&self, text: &str) -> Result<Template, Error> {
        compile_with(text, &self.finder, None)
    }

    /// Render a [`Template`] with the given data.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the data cannot be serialized, a helper fails, or a
    /// helper or partial the `Template` uses is missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use whisker::{Engine, Store};
    ///
    /// let engine = Engine::default();
    /// let template = engine.compile("hello, {{ name }}!").unwrap();
    /// let result = engine.render(&template, &Store::new().with_must("name", "taylor"));
    ///
    /// assert_eq!(result.unwrap(), "hello, taylor!")
    /// ```
    pub fn render<T>(&self, template: &Template, data: &T) -> Result<String, Error>
    where
        T: Serialize,
    {
        let value = to_value(data)
            .map_err(|error| Error::build(UNSERIALIZABLE).with_help(error.to_string()))?;

        self.render_value(template, &value)
    }

    /// Render a [`Template`] with the given [`Value`] as the root context.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a helper fails, or a helper or partial the
    /// `Template` uses is missing.
    #[inline]
    pub fn render_value(&self, template: &Template, value: &Value) -> Result<String, Error> {
        Renderer::new(self).render(template, value)
    }

    /// Add a [`Helper`].
    ///
    /// If a `Helper` with the given name already exists in the [`Engine`], it is replaced.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the name belongs to a built-in block, such as `if`.
    pub fn add_helper(&mut self, name: &str, helper: Helper) -> Result<(), Error> {
        if RESERVED.contains(&name) {
            return Err(Error::build(RESERVED_HELPER).with_help(format!(
                "`{name}` is implemented by the engine and cannot be replaced, \
                choose another name for the helper"
            )));
        }

        if self.helpers.insert(name.to_owned(), helper).is_some() {
            debug!(helper = name, "replaced helper");
        }

        Ok(())
    }

    /// Add an inline [`Helper`], called as `{{name arguments}}`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the name belongs to a built-in block, such as `if`.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use whisker::Engine;
    ///
    /// let mut engine = Engine::default();
    /// engine
    ///     .add_inline("upper", |pipe, _, arguments| {
    ///         let text = arguments.get(0).and_then(|value| value.as_str()).unwrap_or_default();
    ///         Ok(pipe.write(&text.to_uppercase())?)
    ///     })
    ///     .unwrap();
    ///
    /// let template = engine.compile("{{upper name}}").unwrap();
    /// assert_eq!(engine.render(&template, &json!({"name": "ada"})).unwrap(), "ADA");
    /// ```
    #[inline]
    pub fn add_inline<F>(&mut self, name: &str, helper: F) -> Result<(), Error>
    where
        F: Fn(&mut Pipe, &Context, &Arguments) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.add_helper(name, Helper::inline(helper))
    }

    /// Add a block [`Helper`], opened as `{{#name arguments}}`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the name belongs to a built-in block, such as `if`.
    #[inline]
    pub fn add_block<F>(&mut self, name: &str, helper: F) -> Result<(), Error>
    where
        F: Fn(&mut Pipe, &Options, &Context, &Arguments) -> Result<(), Error>
            + Send
            + Sync
            + 'static,
    {
        self.add_helper(name, Helper::block(helper))
    }

    /// Add a [`Helper`].
    ///
    /// Returns the [`Engine`], so additional methods may be chained.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the name belongs to a built-in block, such as `if`.
    #[inline]
    pub fn with_helper(mut self, name: &str, helper: Helper) -> Result<Self, Error> {
        self.add_helper(name, helper)?;
        Ok(self)
    }

    /// Add an inline [`Helper`].
    ///
    /// Returns the [`Engine`], so additional methods may be chained.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the name belongs to a built-in block, such as `if`.
    #[inline]
    pub fn with_inline<F>(mut self, name: &str, helper: F) -> Result<Self, Error>
    where
        F: Fn(&mut Pipe, &Context, &Arguments) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.add_inline(name, helper)?;
        Ok(self)
    }

    /// Add a block [`Helper`].
    ///
    /// Returns the [`Engine`], so additional methods may be chained.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the name belongs to a built-in block, such as `if`.
    #[inline]
    pub fn with_block<F>(mut self, name: &str, helper: F) -> Result<Self, Error>
    where
        F: Fn(&mut Pipe, &Options, &Context, &Arguments) -> Result<(), Error>
            + Send
            + Sync
            + 'static,
    {
        self.add_block(name, helper)?;
        Ok(self)
    }

    /// Return the [`Helper`] with the given name, if it exists in the [`Engine`].
    #[inline]
    pub fn get_helper(&self, name: &str) -> Option<&Helper> {
        self.helpers.get(name)
    }

    /// Compile and store a partial [`Template`] with the given name.
    ///
    /// If a partial with the given name already exists in the [`Engine`],
    /// it is replaced.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when compilation fails, which most likely means the source
    /// contains invalid syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use whisker::Engine;
    ///
    /// let mut engine = Engine::default();
    /// engine.add_partial("greeting", "hello, {{ name }}!").unwrap();
    ///
    /// assert!(engine.get_partial("greeting").is_some());
    /// ```
    pub fn add_partial(&mut self, name: &str, text: &str) -> Result<(), Error> {
        let template = compile_with(text, &self.finder, Some(name))?;

        if self.partials.insert(name.to_owned(), template).is_some() {
            debug!(partial = name, "replaced partial");
        }

        Ok(())
    }

    /// Compile and store a partial [`Template`] with the given name.
    ///
    /// Returns the [`Engine`], so additional methods may be chained.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when compilation fails.
    #[inline]
    pub fn with_partial(mut self, name: &str, text: &str) -> Result<Self, Error> {
        self.add_partial(name, text)?;
        Ok(self)
    }

    /// Return the partial [`Template`] with the given name, if it exists in the [`Engine`].
    #[inline]
    pub fn get_partial(&self, name: &str) -> Option<&Template> {
        self.partials.get(name)
    }

    /// Set the [`Escape`] applied to `{{ }}` output.
    #[inline]
    pub fn set_escape(&mut self, escape: Escape) {
        self.escape = escape;
    }

    /// Set the [`Escape`] applied to `{{ }}` output.
    ///
    /// Returns the [`Engine`], so additional methods may be chained.
    #[inline]
    pub fn with_escape(mut self, escape: Escape) -> Self {
        self.set_escape(escape);
        self
    }

    /// Return the [`Escape`] applied to `{{ }}` output.
    #[inline]
    pub fn get_escape(&self) -> Escape {
        self.escape
    }

    /// Set how deep partials may be nested before rendering fails.
    #[inline]
    pub fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
    }

    /// Set how deep partials may be nested before rendering fails.
    ///
    /// Returns the [`Engine`], so additional methods may be chained.
    #[inline]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.set_depth(depth);
        self
    }

    /// Return how deep partials may be nested.
    #[inline]
    pub fn get_depth(&self) -> usize {
        self.depth
    }
}

impl Debug for Engine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut helpers: Vec<&str> = self.helpers.keys().map(String::as_str).collect();
        let mut partials: Vec<&str> = self.partials.keys().map(String::as_str).collect();
        helpers.sort_unstable();
        partials.sort_unstable();

        f.debug_struct("Engine")
            .field("helpers", &helpers)
            .field("partials", &partials)
            .field("escape", &self.escape)
            .field("depth", &self.depth)
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Builder::new())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        compile::{syntax::Builder, Template},
        helper::Helper,
        log::{Kind, PARTIAL_RECURSION, RESERVED_HELPER, UNKNOWN_PARTIAL},
        pipe::Escape,
        Engine, Store,
    };
    use serde_json::{json, Value};

    fn render(engine: &Engine, source: &str, data: Value) -> String {
        let template = engine.compile(source).unwrap();

        engine.render(&template, &data).unwrap()
    }

    fn render_default(source: &str, data: Value) -> String {
        render(&Engine::default(), source, data)
    }

    fn render_error(engine: &Engine, source: &str, data: Value) -> crate::Error {
        let template = engine.compile(source).unwrap();

        engine.render(&template, &data).unwrap_err()
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<Engine>();
        assert_send_sync::<Template>();
    }

    #[test]
    fn test_debug() {
        let engine = Engine::default()
            .with_partial("footer", "end")
            .unwrap()
            .with_depth(8);

        assert_eq!(
            format!("{engine:?}"),
            r#"Engine { helpers: ["log", "lookup"], partials: ["footer"], escape: Html, depth: 8 }"#
        );
    }

    #[test]
    fn test_literal_text_passthrough() {
        let texts = [
            "",
            "plain text",
            "<b>bold</b> & 'quoted' \"text\"\nsecond line",
            "  leading and trailing whitespace  ",
            "unicode: ünïcödé ✓",
        ];

        for text in texts {
            for data in [Value::Null, json!({"text": "unused"}), json!([1, 2])] {
                assert_eq!(render_default(text, data), text);
            }
        }
    }

    #[test]
    fn test_inversion() {
        let cases = [
            (json!({}), "No key!"),
            (json!({"key": false}), "No key!"),
            (json!({"key": ""}), "No key!"),
            (json!({"key": []}), "No key!"),
            (json!({"key": null}), "No key!"),
            (json!({"key": [1]}), ""),
            (json!({"key": true}), ""),
            (json!({"key": 0}), ""),
            (json!({"key": "text"}), ""),
            (json!({"key": {}}), ""),
        ];

        for (data, expect) in cases {
            assert_eq!(render_default("{{^key}}No key!{{/key}}", data), expect);
        }
    }

    #[test]
    fn test_inversion_messages() {
        assert_eq!(
            render_default("{{^key}}Falsy value!{{/key}}", json!({"key": false})),
            "Falsy value!"
        );
        assert_eq!(
            render_default("{{^key}}Empty sequence!{{/key}}", json!({"key": []})),
            "Empty sequence!"
        );
    }

    #[test]
    fn test_if_else_if_chain() {
        let source = "{{#if a}}A{{else if b}}B{{else}}C{{/if}}";

        assert_eq!(render_default(source, json!({"a": 1, "b": true})), "A");
        assert_eq!(render_default(source, json!({"b": true})), "B");
        assert_eq!(render_default(source, json!({})), "C");
    }

    #[test]
    fn test_unless_and_with() {
        assert_eq!(
            render_default("{{#unless done}}todo{{else}}done{{/unless}}", json!({"done": false})),
            "todo"
        );
        assert_eq!(
            render_default("{{#unless done}}todo{{else}}done{{/unless}}", json!({"done": true})),
            "done"
        );

        let source = "{{#with person}}{{name}} of {{../place}}{{else}}nobody{{/with}}";
        assert_eq!(
            render_default(source, json!({"person": {"name": "ada"}, "place": "london"})),
            "ada of london"
        );
        assert_eq!(render_default(source, json!({"person": null})), "nobody");
    }

    #[test]
    fn test_each_locals() {
        let source = "{{#each items}}{{@index}}:{{this}}{{#if @last}}.{{else}},{{/if}}{{/each}}";
        assert_eq!(render_default(source, json!({"items": ["a", "b"]})), "0:a,1:b.");

        let source = "{{#each map}}{{#if @first}}[{{/if}}{{@key}}={{this}};{{/each}}";
        assert_eq!(render_default(source, json!({"map": {"z": 1, "a": 2}})), "[z=1;a=2;");

        let source = "{{#each items}}{{this}}{{else}}nothing{{/each}}";
        assert_eq!(render_default(source, json!({"items": []})), "nothing");
        assert_eq!(render_default(source, json!({})), "nothing");
    }

    #[test]
    fn test_parent_paths() {
        let source = "{{#each items}}{{../title}}-{{name}};{{/each}}";
        let data = json!({"title": "list", "items": [{"name": "one"}, {"name": "two"}]});

        assert_eq!(render_default(source, data), "list-one;list-two;");
    }

    #[test]
    fn test_root_and_segment_literals() {
        let data = json!({"args": [{"arg": "foo"}, {"arg": "bar"}], "site": "docs"});

        assert_eq!(render_default("{{args.[0].arg}}", data.clone()), "foo");
        assert_eq!(render_default("{{args.[1].arg}}", data.clone()), "bar");
        assert_eq!(
            render_default("{{#each args}}{{@root.site}}/{{arg}} {{/each}}", data),
            "docs/foo docs/bar "
        );
    }

    #[test]
    fn test_sections() {
        assert_eq!(
            render_default("{{#person}}{{name}}{{/person}}", json!({"person": {"name": "ada"}})),
            "ada"
        );
        assert_eq!(
            render_default("{{#items}}<{{this}}>{{/items}}", json!({"items": [1, 2]})),
            "<1><2>"
        );
        assert_eq!(
            render_default("{{#flag}}{{name}}{{/flag}}", json!({"flag": true, "name": "on"})),
            "on"
        );
        assert_eq!(
            render_default("{{#flag}}yes{{else}}no{{/flag}}", json!({"flag": 0})),
            "yes"
        );
        assert_eq!(render_default("{{#flag}}yes{{else}}no{{/flag}}", json!({})), "no");
    }

    #[test]
    fn test_escaping() {
        let data = json!({"html": "<b>\"hi\" & 'bye'</b>"});

        assert_eq!(
            render_default("{{html}}", data.clone()),
            "&lt;b&gt;&quot;hi&quot; &amp; &#39;bye&#39;&lt;/b&gt;"
        );
        assert_eq!(render_default("{{{html}}}", data.clone()), "<b>\"hi\" & 'bye'</b>");
        assert_eq!(render_default("{{& html}}", data.clone()), "<b>\"hi\" & 'bye'</b>");

        let engine = Engine::default().with_escape(Escape::None);
        assert_eq!(render(&engine, "{{html}}", data), "<b>\"hi\" & 'bye'</b>");
    }

    #[test]
    fn test_whitespace_control() {
        let data = json!({"name": "x"});

        assert_eq!(render_default("a  {{~ name ~}}  b", data.clone()), "axb");
        assert_eq!(render_default("a  {{~ name }}  b", data.clone()), "ax  b");
        assert_eq!(
            render_default(
                "<ul>\n  {{~#each items~}}\n  <li>{{this}}</li>\n  {{~/each~}}\n</ul>",
                json!({"items": [1, 2]})
            ),
            "<ul><li>1</li><li>2</li></ul>"
        );

        let engine = Engine::new(Builder::new().with_expression("<%", "%>").with_whitespace('-'));
        assert_eq!(render(&engine, "a <%- name -%> b {{name}}", data), "axb {{name}}");
    }

    #[test]
    fn test_helper_last_wins() {
        let mut engine = Engine::default();
        engine.add_inline("greet", |pipe, _, _| Ok(pipe.write("a")?)).unwrap();
        let template = engine.compile("{{greet}}").unwrap();
        assert_eq!(engine.render(&template, &json!({})).unwrap(), "a");

        engine.add_inline("greet", |pipe, _, _| Ok(pipe.write("b")?)).unwrap();
        assert_eq!(engine.render(&template, &json!({})).unwrap(), "b");
    }

    #[test]
    fn test_helper_replaces_builtin() {
        let engine = Engine::default()
            .with_inline("lookup", |pipe, _, _| Ok(pipe.write("mine")?))
            .unwrap();

        assert_eq!(render(&engine, "{{lookup a b}}", json!({})), "mine");
    }

    #[test]
    fn test_helper_reserved() {
        for name in ["if", "unless", "each", "with"] {
            let error = Engine::default()
                .with_inline(name, |_, _, _| Ok(()))
                .unwrap_err();

            assert_eq!(error.reason(), RESERVED_HELPER);
            assert_eq!(error.kind(), Kind::Render);
        }
    }

    #[test]
    fn test_helper_added_after_compile() {
        let mut engine = Engine::default();
        let template = engine.compile("{{#bold}}{{name}}{{/bold}}").unwrap();

        engine
            .add_block("bold", |pipe, options, context, _| {
                pipe.write_safe("<b>")?;
                options.template(pipe, context)?;
                Ok(pipe.write_safe("</b>")?)
            })
            .unwrap();

        assert_eq!(engine.render(&template, &json!({"name": "ada"})).unwrap(), "<b>ada</b>");
    }

    #[test]
    fn test_helper_as_path_value() {
        let engine = Engine::default()
            .with_helper("now", Helper::inline(|pipe, _, _| Ok(pipe.write("noon")?)))
            .unwrap();

        assert_eq!(render(&engine, "{{now}} {{then}}", json!({"then": "dawn"})), "noon dawn");
    }

    #[test]
    fn test_unknown_helper() {
        let engine = Engine::default();

        let error = render_error(&engine, "{{missing 1}}", json!({}));
        assert_eq!(error.kind(), Kind::UnknownHelper);

        let error = render_error(&engine, "{{#missing 1}}x{{/missing}}", json!({}));
        assert_eq!(error.kind(), Kind::UnknownHelper);

        let error = render_error(&engine, "{{lookup (missing 1) 'a'}}", json!({}));
        assert_eq!(error.kind(), Kind::UnknownHelper);
    }

    #[test]
    fn test_helper_wrong_form() {
        let engine = Engine::default()
            .with_inline("inline", |_, _, _| Ok(()))
            .unwrap()
            .with_block("block", |_, _, _, _| Ok(()))
            .unwrap();

        assert_eq!(render_error(&engine, "{{block 1}}", json!({})).kind(), Kind::Render);
        assert_eq!(render_error(&engine, "{{block}}", json!({})).kind(), Kind::Render);
        assert_eq!(
            render_error(&engine, "{{#inline}}x{{/inline}}", json!({})).kind(),
            Kind::Render
        );
    }

    #[test]
    fn test_partial_context_and_hash() {
        let engine = Engine::default()
            .with_partial("user", "{{name}}!")
            .unwrap();

        assert_eq!(render(&engine, "{{> user}}", json!({"name": "ada"})), "ada!");
        assert_eq!(
            render(&engine, "{{> user person}}", json!({"person": {"name": "bo"}})),
            "bo!"
        );
        assert_eq!(render(&engine, "{{> user name=\"cy\"}}", json!({"name": "ada"})), "cy!");
        assert_eq!(
            render(
                &engine,
                "{{> user person name=other}}",
                json!({"person": {"name": "bo"}, "other": "di"})
            ),
            "di!"
        );
        assert_eq!(render(&engine, "{{> \"user\"}}", json!({"name": "ed"})), "ed!");
    }

    #[test]
    fn test_partial_added_after_compile() {
        let mut engine = Engine::default();
        let template = engine.compile("[{{> footer}}]").unwrap();

        let error = engine.render(&template, &json!({})).unwrap_err();
        assert_eq!(error.reason(), UNKNOWN_PARTIAL);

        engine.add_partial("footer", "end").unwrap();
        assert_eq!(engine.render(&template, &json!({})).unwrap(), "[end]");

        engine.add_partial("footer", "fin").unwrap();
        assert_eq!(engine.render(&template, &json!({})).unwrap(), "[fin]");
    }

    #[test]
    fn test_partial_recursion() {
        let engine = Engine::default()
            .with_partial("loop", "x{{> loop}}")
            .unwrap();
        let error = render_error(&engine, "{{> loop}}", json!({}));

        assert_eq!(error.reason(), PARTIAL_RECURSION);
        assert_eq!(error.kind(), Kind::Render);
    }

    #[test]
    fn test_partial_recursion_with_new_context() {
        let engine = Engine::default()
            .with_partial("tree", "{{name}}({{#each children}}{{> tree}}{{/each}})")
            .unwrap();
        let data = json!({
            "name": "a",
            "children": [{"name": "b", "children": [{"name": "c", "children": []}]}]
        });

        assert_eq!(render(&engine, "{{> tree}}", data), "a(b(c()))");
    }

    #[test]
    fn test_partial_depth() {
        let engine = Engine::default()
            .with_partial("outer", "<{{> inner}}>")
            .unwrap()
            .with_partial("inner", "x")
            .unwrap();
        assert_eq!(render(&engine, "{{> outer}}", json!({})), "<x>");

        let engine = engine.with_depth(1);
        assert_eq!(engine.get_depth(), 1);
        assert_eq!(
            render_error(&engine, "{{> outer}}", json!({})).reason(),
            PARTIAL_RECURSION
        );
    }

    #[test]
    fn test_partial_errors_are_named() {
        let engine = Engine::default()
            .with_partial("broken", "line\n{{missing 1}}")
            .unwrap();
        let error = render_error(&engine, "{{> broken}}", json!({}));

        assert_eq!(error.kind(), Kind::UnknownHelper);
        assert_eq!(error.get_name(), Some("broken"));

        let error = Engine::default().with_partial("bad", "{{#if}}").unwrap_err();
        assert_eq!(error.get_name(), Some("bad"));
    }

    #[test]
    fn test_render_store() {
        let engine = Engine::default();
        let template = engine.compile("{{a}} {{b.c}}").unwrap();
        let store = Store::new().with_must("a", 1).with_must("b", json!({"c": [1, 2]}));

        assert_eq!(engine.render(&template, &store).unwrap(), "1 1,2");
    }

    #[test]
    fn test_render_concurrently() {
        let engine = Engine::default();
        let template = engine.compile("{{#each items}}{{this}}{{/each}}").unwrap();

        std::thread::scope(|scope| {
            for count in 0..4 {
                let (engine, template) = (&engine, &template);
                scope.spawn(move || {
                    let items: Vec<usize> = (0..count).collect();
                    let expect: String = items.iter().map(ToString::to_string).collect();

                    assert_eq!(engine.render(template, &json!({"items": items})).unwrap(), expect);
                });
            }
        });
    }
}
