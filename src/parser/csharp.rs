//! C#-specific grammar: `using`/`namespace` directives, base lists and the
//! member forms Java lacks (properties, indexers, events, operators,
//! destructors).

use std::collections::HashMap;

use crate::diagnostics::SyntaxError;
use crate::model::{simple_name, ImportRecord, Span};

use super::decl::name_of;
use super::modifiers::ResolvedPrefix;
use super::tree::{DeclId, DeclKind, DeclTree, FieldDecl, TypeKind};
use super::{PResult, Parser};

impl<'src> Parser<'src> {
    /// `using` directives, `extern alias`, namespaces and assembly-level
    /// attribute sections. Returns false when none starts here.
    pub(super) fn csharp_directive(&mut self) -> PResult<bool> {
        let start = self.here().start;
        if self.at_word("global") && self.at_n_word(1, "using") {
            self.pos += 1;
        }
        if self.eat_word("using") {
            let is_static = self.eat_word("static");
            let alias = match self.peek() {
                Some(tok) if tok.is_ident() && self.at_n(1, "=") => {
                    self.pos += 2;
                    Some(name_of(tok).to_string())
                }
                _ => None,
            };
            let path = self.type_ref()?;
            self.expect(";", "after using directive")?;
            self.imports.push(ImportRecord {
                path,
                is_static,
                is_wildcard: false,
                alias,
                span: Span::new(start, self.prev_end()),
            });
            return Ok(true);
        }
        if self.at_word("extern") && self.at_n_word(1, "alias") {
            self.pos += 2;
            self.expect_ident("alias name")?;
            self.expect(";", "after extern alias")?;
            return Ok(true);
        }
        if self.at("[")
            && (self.at_n_word(1, "assembly") || self.at_n_word(1, "module"))
            && self.at_n(2, ":")
        {
            self.skip_group("[", "]")?;
            return Ok(true);
        }
        if self.eat_word("namespace") {
            let name = self.type_ref()?;
            if self.eat(";") {
                self.namespaces.push(name);
                return Ok(true);
            }
            let open = self.expect("{", "to open the namespace body")?;
            self.namespace_body(name, open.span);
            return Ok(true);
        }
        Ok(false)
    }

    fn namespace_body(&mut self, name: String, open: Span) {
        self.namespaces.push(name);
        loop {
            if self.at_eof() {
                if self.unwinding.is_none() {
                    self.diagnostics.syntax(&SyntaxError::new(
                        "unexpected end of input: missing `}` for namespace",
                        Span::new(open.start, self.prev_end()),
                    ));
                }
                break;
            }
            if self.eat("}") {
                break;
            }
            self.unit_item();
        }
        self.namespaces.pop();
    }

    /// `: A, B<T>, C(args)` base list followed by `where` constraints.
    pub(super) fn csharp_type_clauses(&mut self, id: DeclId, kind: TypeKind) -> PResult<()> {
        if self.eat(":") {
            let mut bases = Vec::new();
            loop {
                bases.push(self.type_ref()?);
                if self.at("(") {
                    self.skip_group("(", ")")?;
                }
                if !self.eat(",") {
                    break;
                }
            }
            if let DeclKind::Type(decl) = &mut self.tree.get_mut(id).kind {
                match kind {
                    // underlying integral type
                    TypeKind::Enum => {}
                    TypeKind::Interface | TypeKind::Struct => decl.interfaces = bases,
                    _ => decl.unclassified_bases = bases,
                }
            }
        }
        self.skip_constraints();
        Ok(())
    }

    /// Skip `where T : ...` clauses up to the body, `;` or `=>`.
    pub(super) fn skip_constraints(&mut self) {
        if !self.at_word("where") {
            return;
        }
        while let Some(tok) = self.peek() {
            if tok.is_punct("{") || tok.is_punct(";") || tok.is_punct("=>") || self.at_dedented_decl()
            {
                break;
            }
            self.pos += 1;
        }
    }

    pub(super) fn csharp_member(
        &mut self,
        parent: DeclId,
        prefix: ResolvedPrefix,
        start: usize,
        doc: Option<String>,
    ) -> PResult<()> {
        if self.eat("~") {
            let name = self.expect_ident("destructor name")?;
            let full = format!("~{}", name_of(name));
            return self.method(parent, prefix, start, doc, &full, name.span, "void".into(), None);
        }
        if self.at_ident() && self.at_n(1, "(") {
            return self.constructor(parent, prefix, start, doc, true);
        }
        if self.at_word("operator") && (prefix.has("implicit") || prefix.has("explicit")) {
            let op = self.here();
            self.pos += 1;
            let target = self.type_ref()?;
            let name = format!("operator {}", target);
            return self.method(parent, prefix, start, doc, &name, op, target, None);
        }

        let type_name = self.type_ref()?;
        if self.at_word("operator") {
            let op = self.here();
            self.pos += 1;
            let symbol = self.pos;
            while !self.at("(") && !self.at_eof() && self.pos - symbol < 3 {
                self.pos += 1;
            }
            if self.pos == symbol || !self.at("(") {
                return Err(self.expected("an overloadable operator", "after `operator`"));
            }
            let text: String = self.sig[symbol..self.pos]
                .iter()
                .map(|&i| self.all[i].text)
                .collect();
            let name = format!("operator {}", text);
            return self.method(parent, prefix, start, doc, &name, op, type_name, None);
        }
        if self.at_word("this") && self.at_n(1, "[") {
            let this = self.here();
            self.pos += 1;
            self.params("[", "]")?;
            return self.property(parent, prefix, start, doc, "this", this, type_name);
        }

        // Explicit interface implementations (`IComparable<T>.CompareTo`)
        // keep only the member's own name.
        let mut name = self.expect_ident("member name")?;
        let mut type_params = None;
        loop {
            if self.at("<") {
                type_params = Some(self.type_args()?);
            }
            if self.at(".") && self.peek_n(1).is_some_and(|t| t.is_ident()) {
                self.pos += 1;
                name = self.expect_ident("member name")?;
                type_params = None;
                continue;
            }
            break;
        }
        if self.at("(") {
            return self.method(
                parent,
                prefix,
                start,
                doc,
                name_of(name),
                name.span,
                type_name,
                type_params,
            );
        }
        if type_params.is_some() {
            return Err(self.expected("`(`", "after generic method name"));
        }
        if self.at("{") || self.at("=>") {
            return self.property(parent, prefix, start, doc, name_of(name), name.span, type_name);
        }
        let event = prefix.has("event");
        self.fields(parent, prefix, start, doc, name, type_name, event)
    }

    /// Property, indexer or event with an accessor block or `=>` body.
    #[allow(clippy::too_many_arguments)]
    fn property(
        &mut self,
        parent: DeclId,
        prefix: ResolvedPrefix,
        start: usize,
        doc: Option<String>,
        name: &str,
        name_span: Span,
        type_name: String,
    ) -> PResult<()> {
        let id = self.tree.add(
            parent,
            name,
            DeclKind::Field(FieldDecl {
                type_name,
                has_initializer: false,
                property: true,
                component: false,
            }),
            &prefix,
            Span::new(start, name_span.end),
            doc,
        );
        self.property_rest(id).map_err(|f| f.with_node(id))
    }

    fn property_rest(&mut self, id: DeclId) -> PResult<()> {
        let mut initialized = false;
        if self.at("{") {
            self.skip_block()?;
            if self.eat("=") {
                if self.skip_expression(false) == 0 {
                    return Err(self.expected("initializer expression", "after `=`"));
                }
                self.expect(";", "after property initializer")?;
                initialized = true;
            }
        } else if self.eat("=>") {
            if self.skip_expression(false) == 0 {
                return Err(self.expected("an expression", "after `=>`"));
            }
            self.expect(";", "after expression body")?;
        } else {
            return Err(self.expected("`{` or `=>`", "in property declaration"));
        }
        if let DeclKind::Field(field) = &mut self.tree.get_mut(id).kind {
            field.has_initializer = initialized;
        }
        let end = self.prev_end();
        self.tree.set_end(id, end);
        Ok(())
    }
}

/// Split each class or record base list into superclass and interfaces.
///
/// The first base is the superclass when it names a class or record
/// declared in this unit, or when it is unknown here and does not follow
/// the `IName` interface convention.
pub(super) fn classify_bases(tree: &mut DeclTree) {
    let kinds: HashMap<String, TypeKind> = tree
        .nodes()
        .filter_map(|n| n.type_kind().map(|k| (n.name.clone(), k)))
        .collect();
    let pending: Vec<DeclId> = tree
        .nodes()
        .filter(|n| n.type_decl().is_some_and(|t| !t.unclassified_bases.is_empty()))
        .map(|n| n.id)
        .collect();
    for id in pending {
        let DeclKind::Type(decl) = &mut tree.get_mut(id).kind else {
            continue;
        };
        let mut bases = std::mem::take(&mut decl.unclassified_bases).into_iter();
        if let Some(first) = bases.next() {
            if names_class(&first, &kinds) {
                decl.superclass = Some(first);
            } else {
                decl.interfaces.push(first);
            }
        }
        decl.interfaces.extend(bases);
    }
}

fn names_class(base: &str, kinds: &HashMap<String, TypeKind>) -> bool {
    let name = simple_name(base);
    match kinds.get(name) {
        Some(TypeKind::Class | TypeKind::Record) => true,
        Some(TypeKind::Interface) => false,
        _ => !looks_like_interface(name),
    }
}

fn looks_like_interface(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('I') && chars.next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variant;
    use crate::parser::{parse, DeclNode, ParsedUnit};

    fn parse_csharp(source: &str) -> ParsedUnit {
        parse(source, Variant::CSharp)
    }

    fn find<'a>(unit: &'a ParsedUnit, name: &str) -> &'a DeclNode {
        unit.tree
            .nodes()
            .find(|n| n.name == name)
            .unwrap_or_else(|| panic!("no declaration named {}", name))
    }

    fn names(unit: &ParsedUnit) -> Vec<String> {
        unit.tree
            .walk()
            .into_iter()
            .map(|id| unit.tree.get(id).name.clone())
            .collect()
    }

    #[test]
    fn test_sample_program() {
        let unit = parse_csharp(
            r#"
// interface
public interface IGreeter
{
    void Greet();
}

public class Person : IGreeter
{
    public string Name { get; set; }
    public int Age { get; set; }

    public Person(string name, int age)
    {
        Name = name;
        Age = age;
    }

    public void Greet()
    {
        Console.WriteLine($"Hello, I'm {Name}");
    }
}

public enum Color
{
    Red,
    Green,
    Blue
}

public class Repository<T>
{
    private List<T> _items = new List<T>();

    public T Find(Func<T, bool> predicate)
    {
        return _items.FirstOrDefault(predicate);
    }
}

public class UserService
{
    public async Task<IEnumerable<Person>> GetAllUsersAsync()
    {
        await Task.Delay(100);
        return new List<Person>
        {
            new Person("Alice", 30),
        };
    }
}

public record Config(string Version, string Environment);

public static class StringExtensions
{
    public static string PrintWithPrefix(this string s)
    {
        return $">> {s}";
    }
}
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        assert_eq!(
            names(&unit),
            vec![
                "IGreeter",
                "Greet",
                "Person",
                "Name",
                "Age",
                "Person",
                "Greet",
                "Color",
                "Red",
                "Green",
                "Blue",
                "Repository",
                "_items",
                "Find",
                "UserService",
                "GetAllUsersAsync",
                "Config",
                "Version",
                "Environment",
                "StringExtensions",
                "PrintWithPrefix",
            ]
        );

        let person = find(&unit, "Person").type_decl().unwrap();
        assert_eq!(person.superclass, None);
        assert_eq!(person.interfaces, vec!["IGreeter"]);

        match &find(&unit, "Name").kind {
            DeclKind::Field(field) => {
                assert!(field.property);
                assert_eq!(field.type_name, "string");
            }
            other => panic!("expected property, got {:?}", other),
        }

        let repository = find(&unit, "Repository").type_decl().unwrap();
        assert_eq!(repository.type_params.as_deref(), Some("<T>"));
        match &find(&unit, "Find").kind {
            DeclKind::Method(method) => {
                assert_eq!(method.return_type, "T");
                assert_eq!(method.params[0].type_name, "Func<T, bool>");
            }
            other => panic!("expected method, got {:?}", other),
        }
        match &find(&unit, "GetAllUsersAsync").kind {
            DeclKind::Method(method) => {
                assert_eq!(method.return_type, "Task<IEnumerable<Person>>")
            }
            other => panic!("expected method, got {:?}", other),
        }
        assert!(find(&unit, "GetAllUsersAsync").has_modifier("async"));

        let config = find(&unit, "Config");
        assert_eq!(config.type_kind(), Some(TypeKind::Record));
        match &find(&unit, "Version").kind {
            DeclKind::Field(field) => assert!(field.component && field.property),
            other => panic!("expected component, got {:?}", other),
        }
    }

    #[test]
    fn test_usings_and_namespaces() {
        let unit = parse_csharp(
            r#"
using System;
using static System.Math;
using Json = System.Text.Json.JsonSerializer;
global using System.Linq;

[assembly: InternalsVisibleTo("Tests")]

namespace Acme.Billing
{
    namespace Internal
    {
        internal class Ledger { }
    }

    public class Invoice { }
}
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        assert_eq!(unit.package.as_deref(), Some("Acme.Billing.Internal"));
        assert_eq!(unit.imports.len(), 4);
        assert_eq!(unit.imports[0].path, "System");
        assert!(unit.imports[1].is_static);
        assert_eq!(unit.imports[1].path, "System.Math");
        assert_eq!(unit.imports[2].alias.as_deref(), Some("Json"));
        assert_eq!(unit.imports[2].path, "System.Text.Json.JsonSerializer");
        assert_eq!(unit.imports[3].path, "System.Linq");

        assert_eq!(names(&unit), vec!["Ledger", "Invoice"]);
        let root = unit.tree.root();
        assert_eq!(unit.tree.children(root).len(), 2);
        assert!(find(&unit, "Ledger").annotations.is_empty());
    }

    #[test]
    fn test_file_scoped_namespace() {
        let unit = parse_csharp("namespace Acme.Core;\n\npublic interface IRepo { }\n");
        assert!(unit.diagnostics.is_empty());
        assert_eq!(unit.package.as_deref(), Some("Acme.Core"));
        assert_eq!(names(&unit), vec!["IRepo"]);
    }

    #[test]
    fn test_member_forms() {
        let unit = parse_csharp(
            r#"
public class Money : IEquatable<Money>, IComparable
{
    private readonly decimal _amount;
    public event EventHandler Changed;
    public event EventHandler Cleared { add { } remove { } }

    public decimal this[int index] => _amount;

    public Money(decimal amount) : this(amount, "EUR") { }
    public Money(decimal amount, string currency) { _amount = amount; }
    ~Money() { }

    public static Money operator +(Money a, Money b) => new Money(a._amount + b._amount);
    public static implicit operator decimal(Money m) => m._amount;

    public bool Equals(Money other) => other != null && other._amount == _amount;
    int IComparable.CompareTo(object obj) { return 0; }
    public override string ToString() => $"{_amount}";
    public T Convert<T>(Func<decimal, T> f) where T : struct => f(_amount);
    public string Label { get; init; } = "cash";
}
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        assert_eq!(
            names(&unit),
            vec![
                "Money",
                "_amount",
                "Changed",
                "Cleared",
                "this",
                "Money",
                "Money",
                "~Money",
                "operator +",
                "operator decimal",
                "Equals",
                "CompareTo",
                "ToString",
                "Convert",
                "Label",
            ]
        );

        let money = find(&unit, "Money").type_decl().unwrap();
        assert_eq!(money.superclass, None);
        assert_eq!(money.interfaces, vec!["IEquatable<Money>", "IComparable"]);

        for name in ["Changed", "Cleared", "this"] {
            match &find(&unit, name).kind {
                DeclKind::Field(field) => assert!(field.property, "{} is a property", name),
                other => panic!("expected property for {}, got {:?}", name, other),
            }
        }
        match &find(&unit, "Label").kind {
            DeclKind::Field(field) => assert!(field.has_initializer),
            other => panic!("expected property, got {:?}", other),
        }
        match &find(&unit, "operator decimal").kind {
            DeclKind::Method(method) => assert_eq!(method.return_type, "decimal"),
            other => panic!("expected method, got {:?}", other),
        }
        match &find(&unit, "ToString").kind {
            DeclKind::Method(method) => {
                assert!(method.is_override);
                assert!(method.body.is_some());
            }
            other => panic!("expected method, got {:?}", other),
        }
        match &find(&unit, "Convert").kind {
            DeclKind::Method(method) => assert_eq!(method.type_params.as_deref(), Some("<T>")),
            other => panic!("expected method, got {:?}", other),
        }
    }

    #[test]
    fn test_base_list_classification() {
        let unit = parse_csharp(
            r#"
public abstract class Shape { public abstract double Area(); }
public class Circle : Shape, IDrawable { public override double Area() => 3.14; }
public interface IDrawable : IDisposable { void Draw(); }
public struct Point : IFormattable { public int X; }
public record Person(string Name, int Age) : Entity(Name);
public record struct Pair(int A, int B);
public class Widget : Component { }
public class Handler : IHandler { }
public enum Flags : byte { None = 0, Read = 1 << 0, Write = 1 << 1, }
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);

        let circle = find(&unit, "Circle").type_decl().unwrap();
        assert_eq!(circle.superclass.as_deref(), Some("Shape"));
        assert_eq!(circle.interfaces, vec!["IDrawable"]);

        let drawable = find(&unit, "IDrawable").type_decl().unwrap();
        assert_eq!(drawable.superclass, None);
        assert_eq!(drawable.interfaces, vec!["IDisposable"]);

        let point = find(&unit, "Point").type_decl().unwrap();
        assert_eq!(point.kind, TypeKind::Struct);
        assert_eq!(point.interfaces, vec!["IFormattable"]);

        let person = find(&unit, "Person");
        assert_eq!(person.type_decl().unwrap().superclass.as_deref(), Some("Entity"));
        assert_eq!(person.children.len(), 2);

        assert_eq!(find(&unit, "Pair").type_kind(), Some(TypeKind::Record));
        let widget = find(&unit, "Widget").type_decl().unwrap();
        assert_eq!(widget.superclass.as_deref(), Some("Component"));
        let handler = find(&unit, "Handler").type_decl().unwrap();
        assert_eq!(handler.superclass, None);
        assert_eq!(handler.interfaces, vec!["IHandler"]);

        let flags = find(&unit, "Flags");
        assert_eq!(flags.children.len(), 3);
        assert!(flags.type_decl().unwrap().interfaces.is_empty());
    }

    #[test]
    fn test_attributes_docs_and_delegates() {
        let unit = parse_csharp(
            r#"
/// <summary>Handles requests.</summary>
[Serializable]
[Obsolete("use v2"), DebuggerDisplay("{Name}")]
public sealed class Handler
{
    [return: NotNull]
    public virtual string Handle([FromBody] string body, params object[] rest) { return body; }
}

public delegate void Callback(int code);
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let handler = find(&unit, "Handler");
        assert_eq!(handler.doc.as_deref(), Some("<summary>Handles requests.</summary>"));
        let attrs: Vec<_> = handler.annotations.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(attrs, vec!["Serializable", "Obsolete", "DebuggerDisplay"]);
        assert_eq!(handler.annotations[1].arguments.as_deref(), Some("\"use v2\""));
        assert!(handler.has_modifier("sealed"));

        match &find(&unit, "Handle").kind {
            DeclKind::Method(method) => {
                assert_eq!(method.params.len(), 2);
                assert_eq!(method.params[0].type_name, "string");
                assert!(method.params[1].varargs);
                assert_eq!(method.params[1].type_name, "object[]");
            }
            other => panic!("expected method, got {:?}", other),
        }

        let callback = find(&unit, "Callback");
        assert_eq!(callback.parent, Some(unit.tree.root()));
        assert!(callback.has_modifier("delegate"));
        assert!(matches!(callback.kind, DeclKind::Method(_)));
    }

    #[test]
    fn test_missing_brace_inside_namespace() {
        let unit = parse_csharp(
            r#"namespace App
{
    public class Broken
    {
        public void Run()
        {
            var x = 1;

    public class Fine
    {
        public int Value { get; set; }
    }
}
"#,
        );
        assert_eq!(unit.diagnostics.len(), 1, "{:?}", unit.diagnostics);
        assert_eq!(names(&unit), vec!["Broken", "Run", "Fine", "Value"]);
        assert!(find(&unit, "Broken").partial);
        assert!(find(&unit, "Run").partial);
        assert!(!find(&unit, "Fine").partial);
    }

    #[test]
    fn test_multidimensional_array_types() {
        let unit = parse_csharp(
            "class Grid\n{\n    int[,] cells;\n    string[,,][] layers;\n    int?[] maybe;\n}\n",
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let types: Vec<_> = ["cells", "layers", "maybe"]
            .iter()
            .map(|name| match &find(&unit, name).kind {
                DeclKind::Field(f) => f.type_name.clone(),
                other => panic!("expected field, got {:?}", other),
            })
            .collect();
        assert_eq!(types, vec!["int[,]", "string[,,][]", "int?[]"]);
    }

    #[test]
    fn test_truncated_array_type() {
        let unit = parse_csharp("class Grid {\n    int[,");
        assert_eq!(names(&unit), vec!["Grid"]);
        assert!(unit
            .diagnostics
            .iter()
            .any(|d| d.message == "expected `]` in array type, found end of input"));

        let unit = parse_csharp("class Grid {\n    int[, x;\n    int ok;\n}\n");
        assert_eq!(names(&unit), vec!["Grid", "ok"]);
        assert_eq!(unit.diagnostics.len(), 1, "{:?}", unit.diagnostics);
    }

    #[test]
    fn test_interface_convention() {
        assert!(looks_like_interface("IDisposable"));
        assert!(!looks_like_interface("Item"));
        assert!(!looks_like_interface("I"));
    }
}
