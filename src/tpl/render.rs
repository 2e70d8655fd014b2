use crate::data::Value;
use crate::tpl::escape::write_escaped;
use crate::tpl::render_context::Context;
use crate::tpl::{Node, PartialTable};
use std::borrow::Cow;
use std::fmt;

pub(crate) fn render<W: fmt::Write>(
    nodes: &[Node],
    ctx: &mut Context<'_>,
    partials: &PartialTable,
    out: &mut W,
) -> fmt::Result {
    let mut writer = Writer {
        out,
        indent: String::new(),
        at_line_start: false,
    };
    render_nodes(nodes, ctx, partials, &mut writer)
}

/// Output sink that indents the lines a partial's own text starts. Line
/// breaks coming from interpolated values never open an indented line.
struct Writer<'w, W> {
    out: &'w mut W,
    indent: String,
    at_line_start: bool,
}

impl<W: fmt::Write> Writer<'_, W> {
    fn start_line(&mut self) -> fmt::Result {
        if self.at_line_start {
            self.at_line_start = false;
            self.out.write_str(&self.indent)?;
        }
        Ok(())
    }

    /// Template text: the indent is written lazily, so a trailing line break
    /// leaves no indent behind.
    fn text(&mut self, text: &str) -> fmt::Result {
        for line in text.split_inclusive('\n') {
            self.start_line()?;
            self.out.write_str(line)?;
            self.at_line_start = line.ends_with('\n');
        }
        Ok(())
    }

    fn value(&mut self, text: &str, escape: bool) -> fmt::Result {
        if text.is_empty() {
            return Ok(());
        }
        self.start_line()?;
        if escape {
            write_escaped(&mut *self.out, text)
        } else {
            self.out.write_str(text)
        }
    }
}

fn render_nodes<'a, W: fmt::Write>(
    nodes: &[Node],
    ctx: &mut Context<'a>,
    partials: &PartialTable,
    out: &mut Writer<'_, W>,
) -> fmt::Result {
    for node in nodes {
        match node {
            Node::Text(t) => out.text(t)?,
            Node::Variable(name) => {
                if let Some(text) = ctx.resolve(name).and_then(|v| v.to_text()) {
                    out.value(&text, true)?;
                }
            }
            Node::LiteralVariable(name) => {
                if let Some(text) = ctx.resolve(name).and_then(|v| v.to_text()) {
                    out.value(&text, false)?;
                }
            }
            Node::Section { name, children } => {
                if let Some(value) = ctx.resolve(name) {
                    render_section(value, children, ctx, partials, out)?;
                }
            }
            Node::InvertedSection { name, children } => {
                if !ctx.resolve(name).is_some_and(|v| is_truthy(&v)) {
                    render_nodes(children, ctx, partials, out)?;
                }
            }
            Node::Partial { name, indent } => {
                let Some(partial) = partials.get(name) else {
                    continue;
                };
                // a standalone include starts on a fresh line, indented by
                // every enclosing partial plus its own indent
                let outer = out.indent.len();
                if !indent.is_empty() {
                    out.indent.push_str(indent);
                    out.at_line_start = true;
                }
                let result = render_nodes(partial, ctx, partials, out);
                out.indent.truncate(outer);
                result?;
            }
        }
    }
    Ok(())
}

fn render_section<'a, W: fmt::Write>(
    value: Cow<'a, Value>,
    children: &[Node],
    ctx: &mut Context<'a>,
    partials: &PartialTable,
    out: &mut Writer<'_, W>,
) -> fmt::Result {
    match value {
        Cow::Borrowed(Value::List(items)) => {
            iterate(items.iter().map(Cow::Borrowed), children, ctx, partials, out)
        }
        Cow::Owned(Value::List(items)) => {
            iterate(items.into_iter().map(Cow::Owned), children, ctx, partials, out)
        }
        value if !is_truthy(&value) => Ok(()),
        value => {
            if matches!(value.as_ref(), Value::Variant(_)) {
                ctx.push_variant(value);
            } else {
                ctx.push(value);
            }
            let result = render_nodes(children, ctx, partials, out);
            ctx.pop();
            result
        }
    }
}

fn iterate<'a, W: fmt::Write>(
    items: impl ExactSizeIterator<Item = Cow<'a, Value>>,
    children: &[Node],
    ctx: &mut Context<'a>,
    partials: &PartialTable,
    out: &mut Writer<'_, W>,
) -> fmt::Result {
    let len = items.len();
    for (index, item) in items.enumerate() {
        ctx.push_iteration(item, index, len);
        let result = render_nodes(children, ctx, partials, out);
        ctx.pop();
        result?;
    }
    Ok(())
}

/// Whether a section over `value` renders at least once. An inverted section
/// renders exactly when this is false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::I64(n) => *n != 0,
        Value::U64(n) => *n != 0,
        Value::F64(n) => *n != 0.0,
        Value::Decimal(d) => !d.is_zero(),
        Value::Str(s) => !s.is_empty(),
        Value::List(items) => !items.is_empty(),
        Value::Map(m) => !m.is_empty(),
        Value::Date(_)
        | Value::Time(_)
        | Value::DateTime(_)
        | Value::DateTimeUtc(_)
        | Value::Object(_)
        | Value::Variant(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Variant;
    use crate::loader::MemoryLoader;
    use crate::tpl::{Parser, Template};
    use rust_decimal::Decimal;

    fn render_str(source: &str, data: &Value) -> String {
        Template::parse(source).unwrap().render(data)
    }

    fn data(entries: Vec<(&str, Value)>) -> Value {
        entries.into_iter().collect()
    }

    #[test]
    fn test_text_without_tags_is_unchanged() {
        let source = "Hello, {world}!\n  { not a tag }\r\n";
        assert_eq!(render_str(source, &Value::Null), source);
    }

    #[test]
    fn test_escaping_only_for_variables() {
        let d = data(vec![("v", Value::from("<a&b>"))]);
        assert_eq!(render_str("{{v}}", &d), "&lt;a&amp;b&gt;");
        assert_eq!(render_str("{{{v}}}", &d), "<a&b>");
        assert_eq!(render_str("{{&v}}", &d), "<a&b>");
    }

    #[test]
    fn test_missing_names_render_empty() {
        assert_eq!(render_str("[{{missing}}][{{a.b.c}}]", &data(vec![])), "[][]");
        assert_eq!(render_str("[{{#missing}}x{{/missing}}]", &data(vec![])), "[]");
    }

    #[test]
    fn test_section_truthiness() {
        let d = data(vec![
            ("t", Value::Bool(true)),
            ("f", Value::Bool(false)),
            ("zero", Value::I64(0)),
            ("one", Value::U64(1)),
            ("fzero", Value::F64(0.0)),
            ("dec", Value::Decimal(Decimal::new(5, 1))),
            ("dzero", Value::Decimal(Decimal::ZERO)),
            ("empty", Value::from("")),
            ("s", Value::from("x")),
            ("nil", Value::Null),
            ("emap", data(vec![])),
        ]);
        let source = "{{#t}}t{{/t}}{{#f}}f{{/f}}{{#zero}}0{{/zero}}{{#one}}1{{/one}}\
                      {{#fzero}}F{{/fzero}}{{#dec}}d{{/dec}}{{#dzero}}D{{/dzero}}\
                      {{#empty}}e{{/empty}}{{#s}}s{{/s}}{{#nil}}n{{/nil}}{{#emap}}m{{/emap}}";
        assert_eq!(render_str(source, &d), "t1ds");

        let inverted = "{{^t}}t{{/t}}{{^f}}f{{/f}}{{^zero}}0{{/zero}}{{^one}}1{{/one}}\
                        {{^fzero}}F{{/fzero}}{{^dec}}d{{/dec}}{{^dzero}}D{{/dzero}}\
                        {{^empty}}e{{/empty}}{{^s}}s{{/s}}{{^nil}}n{{/nil}}{{^emap}}m{{/emap}}\
                        {{^missing}}M{{/missing}}";
        assert_eq!(render_str(inverted, &d), "f0FDenmM");
    }

    #[test]
    fn test_list_section_and_inverted() {
        let d = data(vec![("items", Value::from(Vec::<i32>::new()))]);
        assert_eq!(render_str("{{#items}}x{{/items}}", &d), "");
        assert_eq!(render_str("{{^items}}none{{/items}}", &d), "none");
        assert_eq!(render_str("{{^absent}}none{{/absent}}", &d), "none");
    }

    #[test]
    fn test_iteration_metadata() {
        let d = data(vec![("items", Value::from(vec!["a", "b", "c"]))]);
        let source = "{{#items}}{{index}}/{{index1}}:{{.}}{{#first}}F{{/first}}{{#last}}L{{/last}}{{^last}},{{/last}}{{/items}}";
        assert_eq!(render_str(source, &d), "0/1:aF,1/2:b,2/3:cL");
    }

    #[test]
    fn test_map_section_enables_nested_lookup() {
        let d = data(vec![
            ("name", Value::from("outer")),
            (
                "person",
                data(vec![("first", Value::from("Ada")), ("age", Value::from(36))]),
            ),
        ]);
        assert_eq!(
            render_str("{{#person}}{{first}} {{age}} {{name}}{{/person}} {{person.first}}", &d),
            "Ada 36 outer Ada"
        );
    }

    #[test]
    fn test_variant_section() {
        let colour = Variant::new("Green").with_variants(["Red", "Green", "Blue"]);
        let d = data(vec![("colour", Value::from(colour))]);
        let source = "{{#colour}}{{#Red}}r{{/Red}}{{#Green}}g{{/Green}}{{^Blue}}!b{{/Blue}}{{/colour}} {{colour}}";
        assert_eq!(render_str(source, &d), "g!b Green");
    }

    #[test]
    fn test_null_item_hides_parent_names() {
        let d = data(vec![
            ("name", Value::from("outer")),
            ("items", Value::List(vec![Value::Null])),
        ]);
        assert_eq!(
            render_str("{{#items}}[{{name}}]{{^name}}hidden{{/name}}{{/items}}", &d),
            "[]hidden"
        );
    }

    #[test]
    fn test_partial_sees_includer_bindings() {
        let mut parser = Parser::new().with_loader(MemoryLoader::from_entries([("p", "<{{v}}>")]));
        let template = parser.parse_str("{{#items}}{{>p}}{{/items}}").unwrap();
        let d = data(vec![(
            "items",
            Value::List(vec![data(vec![("v", Value::from(1))]), data(vec![("v", Value::from(2))])]),
        )]);
        assert_eq!(template.render(&d), "<1><2>");
    }

    #[test]
    fn test_partial_indentation() {
        let mut parser =
            Parser::new().with_loader(MemoryLoader::from_entries([("p", "L1\nL2")]));
        let template = parser.parse_str("  {{>p}}").unwrap();
        assert_eq!(template.render(&Value::Null), "  L1\n  L2");

        let mut parser =
            Parser::new().with_loader(MemoryLoader::from_entries([("p", "L1\nL2\n")]));
        let template = parser.parse_str("A\n  {{>p}}\nB").unwrap();
        assert_eq!(template.render(&Value::Null), "A\n  L1\n  L2\nB");
    }

    #[test]
    fn test_interpolated_line_breaks_are_not_indented() {
        let mut parser = Parser::new()
            .with_loader(MemoryLoader::from_entries([("partial", "|\n{{{content}}}\n|\n")]));
        let template = parser.parse_str("\\\n {{>partial}}\n/\n").unwrap();
        let d = data(vec![("content", Value::from("<\n->"))]);
        assert_eq!(template.render(&d), "\\\n |\n <\n->\n |\n/\n");
    }

    #[test]
    fn test_inline_partial_inside_indented_partial() {
        let mut parser = Parser::new().with_loader(MemoryLoader::from_entries([
            ("outer", "a {{>inner}}\nb\n"),
            ("inner", "x\ny"),
        ]));
        let template = parser.parse_str("  {{>outer}}\n").unwrap();
        assert_eq!(template.render(&Value::Null), "  a x\n  y\n  b\n");
    }

    #[test]
    fn test_inline_partial_is_not_indented() {
        let mut parser =
            Parser::new().with_loader(MemoryLoader::from_entries([("p", "L1\nL2")]));
        let template = parser.parse_str("  x {{>p}}").unwrap();
        assert_eq!(template.render(&Value::Null), "  x L1\nL2");
    }

    #[test]
    fn test_recursive_partial_terminates_with_data() {
        let mut parser = Parser::new().with_loader(MemoryLoader::from_entries([(
            "node",
            "{{content}}<{{#nodes}}{{>node}}{{/nodes}}>",
        )]));
        let template = parser.parse_str("{{>node}}").unwrap();
        let d = data(vec![
            ("content", Value::from("X")),
            (
                "nodes",
                Value::List(vec![data(vec![
                    ("content", Value::from("Y")),
                    ("nodes", Value::List(vec![])),
                ])]),
            ),
        ]);
        assert_eq!(template.render(&d), "X<Y<>>");
    }

    #[test]
    fn test_scalar_list_and_dot() {
        let d = data(vec![("nums", Value::from(vec![1, 2, 3]))]);
        assert_eq!(render_str("{{#nums}}({{.}}){{/nums}}", &d), "(1)(2)(3)");
        assert_eq!(render_str("{{nums}}", &d), "1,2,3");
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        let d = data(vec![("v", Value::from("naïve"))]);
        assert_eq!(render_str("{{v}}|{{{v}}}", &d), "na&#239;ve|naïve");
    }
}
