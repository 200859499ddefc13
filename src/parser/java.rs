//! Java-specific grammar: `package`/`import` directives, type header
//! clauses and member forms.

use crate::diagnostics::SyntaxError;
use crate::model::{ImportRecord, Span};

use super::decl::name_of;
use super::modifiers::ResolvedPrefix;
use super::tree::{DeclId, DeclKind, TypeKind};
use super::{PResult, Parser};

impl<'src> Parser<'src> {
    /// `package a.b;` or `import [static] a.b.C[.*];`. Returns false when
    /// the current token starts neither.
    pub(super) fn java_directive(&mut self) -> PResult<bool> {
        let start = self.here().start;
        self.skip_package_annotations();
        if self.eat_word("package") {
            let (name, _) = self.dotted_name(false)?;
            self.expect(";", "after package declaration")?;
            self.package = Some(name);
            return Ok(true);
        }
        if self.eat_word("import") {
            let is_static = self.eat_word("static");
            let (path, is_wildcard) = self.dotted_name(true)?;
            self.expect(";", "after import")?;
            self.imports.push(ImportRecord {
                path,
                is_static,
                is_wildcard,
                alias: None,
                span: Span::new(start, self.prev_end()),
            });
            return Ok(true);
        }
        Ok(false)
    }

    /// Annotations on a `package` declaration (`package-info.java`) carry
    /// no symbol; they are skipped. Anything else is left for the
    /// declaration parser.
    fn skip_package_annotations(&mut self) {
        let save = self.pos;
        while self.at("@") && !self.at_n_word(1, "interface") {
            self.skip_annotation();
        }
        if !self.at_word("package") {
            self.pos = save;
        }
    }

    /// `a.b.c`, optionally ending in `.*`.
    fn dotted_name(&mut self, allow_wildcard: bool) -> PResult<(String, bool)> {
        let mut name = self.expect_ident("a qualified name")?.text.to_string();
        while self.at(".") {
            if allow_wildcard && self.at_n(1, "*") {
                self.pos += 2;
                return Ok((name, true));
            }
            self.pos += 1;
            name.push('.');
            name.push_str(self.expect_ident("a name after `.`")?.text);
        }
        Ok((name, false))
    }

    /// `extends`, `implements` and `permits` clauses, in any order.
    pub(super) fn java_type_clauses(&mut self, id: DeclId, kind: TypeKind) -> PResult<()> {
        loop {
            if self.at_word("extends") {
                let clause = self.here();
                self.pos += 1;
                let types = self.type_list()?;
                self.record_extends(id, kind, types, clause);
            } else if self.eat_word("implements") {
                let types = self.type_list()?;
                if let DeclKind::Type(decl) = &mut self.tree.get_mut(id).kind {
                    decl.interfaces.extend(types);
                }
            } else if self.eat_word("permits") {
                self.type_list()?;
            } else {
                return Ok(());
            }
        }
    }

    fn record_extends(&mut self, id: DeclId, kind: TypeKind, types: Vec<String>, clause: Span) {
        let extra = match &mut self.tree.get_mut(id).kind {
            DeclKind::Type(decl) if matches!(kind, TypeKind::Interface | TypeKind::Annotation) => {
                decl.interfaces.extend(types);
                false
            }
            DeclKind::Type(decl) => {
                let mut types = types.into_iter();
                decl.superclass = types.next();
                types.next().is_some()
            }
            _ => false,
        };
        if extra {
            let error = SyntaxError::new(
                format!("`{}` can extend only one class", self.tree.get(id).name),
                Span::new(clause.start, self.prev_end()),
            );
            let diag = self.diagnostics.syntax(&error);
            let end = self.prev_end();
            self.tree.mark_partial(id, diag, end);
        }
    }

    /// Constructor, compact record constructor, method or field.
    pub(super) fn java_member(
        &mut self,
        parent: DeclId,
        prefix: ResolvedPrefix,
        start: usize,
        doc: Option<String>,
    ) -> PResult<()> {
        let type_params = if self.at("<") {
            Some(self.type_args()?)
        } else {
            None
        };
        if self.at_ident() && self.at_n(1, "(") {
            return self.constructor(parent, prefix, start, doc, true);
        }
        if self.at_ident()
            && self.at_n(1, "{")
            && self.is_record(parent)
            && self.peek().is_some_and(|t| name_of(t) == self.tree.get(parent).name)
        {
            return self.constructor(parent, prefix, start, doc, false);
        }
        let return_type = self.type_ref()?;
        let name = self.expect_ident("field or method name")?;
        if self.at("(") {
            return self.method(
                parent,
                prefix,
                start,
                doc,
                name_of(name),
                name.span,
                return_type,
                type_params,
            );
        }
        if type_params.is_some() {
            return Err(self.expected("`(`", "after generic method name"));
        }
        self.fields(parent, prefix, start, doc, name, return_type, false)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::Variant;
    use crate::parser::{parse, DeclKind, DeclNode, ParsedUnit, TypeKind};

    fn parse_java(source: &str) -> ParsedUnit {
        parse(source, Variant::Java)
    }

    fn find<'a>(unit: &'a ParsedUnit, name: &str) -> &'a DeclNode {
        unit.tree
            .nodes()
            .find(|n| n.name == name)
            .unwrap_or_else(|| panic!("no declaration named {}", name))
    }

    #[test]
    fn test_package_and_imports() {
        let unit = parse_java(
            r#"
package com.example.app;

import java.util.List;
import java.util.*;
import static java.lang.Math.max;

public class App {}
"#,
        );
        assert!(unit.diagnostics.is_empty());
        assert_eq!(unit.package.as_deref(), Some("com.example.app"));
        assert_eq!(unit.imports.len(), 3);
        assert_eq!(unit.imports[0].path, "java.util.List");
        assert!(unit.imports[1].is_wildcard);
        assert_eq!(unit.imports[1].path, "java.util");
        assert!(unit.imports[2].is_static);
        assert_eq!(unit.imports[2].path, "java.lang.Math.max");
    }

    #[test]
    fn test_annotated_package_declaration() {
        let unit = parse_java(
            r#"
/** Shop domain. */
@ParametersAreNonnullByDefault
@Generated(value = "tool", date = "2024")
package com.shop;

import javax.annotation.ParametersAreNonnullByDefault;
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        assert_eq!(unit.package.as_deref(), Some("com.shop"));
        assert_eq!(unit.imports.len(), 1);
        assert!(unit.tree.is_empty());

        // Annotations that do not precede `package` still belong to a type.
        let unit = parse_java("@Deprecated
class Old {}
");
        assert!(unit.diagnostics.is_empty());
        assert_eq!(find(&unit, "Old").annotations[0].name, "Deprecated");
    }

    #[test]
    fn test_type_use_annotations_on_array_dimensions() {
        let unit = parse_java(
            r#"
class Names {
    String @NonNull [] names;
    int counts @Size(max = 3) [];
    @Nullable String label;
    String @A [] @B [] grid() { return null; }
}
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        match &find(&unit, "names").kind {
            DeclKind::Field(f) => assert_eq!(f.type_name, "String[]"),
            other => panic!("unexpected {:?}", other),
        }
        match &find(&unit, "counts").kind {
            DeclKind::Field(f) => assert_eq!(f.type_name, "int[]"),
            other => panic!("unexpected {:?}", other),
        }
        match &find(&unit, "grid").kind {
            DeclKind::Method(m) => assert_eq!(m.return_type, "String[][]"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(find(&unit, "label").annotations[0].name, "Nullable");
    }

    #[test]
    fn test_class_header_clauses() {
        let unit = parse_java(
            "public class Dog<T extends Comparable<T>> extends Animal implements Pet, java.io.Serializable {}",
        );
        assert!(unit.diagnostics.is_empty());
        let dog = find(&unit, "Dog").type_decl().unwrap();
        assert_eq!(dog.kind, TypeKind::Class);
        assert_eq!(dog.type_params.as_deref(), Some("<T extends Comparable<T>>"));
        assert_eq!(dog.superclass.as_deref(), Some("Animal"));
        assert_eq!(dog.interfaces, vec!["Pet", "java.io.Serializable"]);
    }

    #[test]
    fn test_interface_extends_goes_to_interfaces() {
        let unit = parse_java("public interface ClickHandler extends EventListener, Serializable {}");
        let handler = find(&unit, "ClickHandler").type_decl().unwrap();
        assert_eq!(handler.kind, TypeKind::Interface);
        assert_eq!(handler.superclass, None);
        assert_eq!(handler.interfaces, vec!["EventListener", "Serializable"]);
    }

    #[test]
    fn test_sealed_hierarchy() {
        let unit = parse_java(
            r#"
public sealed interface Shape permits Circle, Square {}
final class Circle implements Shape {}
non-sealed class Square implements Shape {}
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        assert!(find(&unit, "Shape").has_modifier("sealed"));
        assert!(find(&unit, "Square").has_modifier("non-sealed"));
    }

    #[test]
    fn test_methods_fields_and_constructors() {
        let unit = parse_java(
            r#"
public class UserService {
    private final Map<String, List<User>> users = new HashMap<>(), cache;
    private int[] counts, totals[];

    public UserService(Repository repo) throws IOException {
        this.repo = repo;
    }

    public <T> T find(String id, int... flags) throws UserNotFoundException, IOException {
        return null;
    }

    abstract String[] names()[];

    native void poke();
}
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);

        let users = find(&unit, "users");
        match &users.kind {
            DeclKind::Field(f) => {
                assert_eq!(f.type_name, "Map<String, List<User>>");
                assert!(f.has_initializer);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &find(&unit, "cache").kind {
            DeclKind::Field(f) => assert!(!f.has_initializer),
            other => panic!("unexpected {:?}", other),
        }
        match &find(&unit, "totals").kind {
            DeclKind::Field(f) => assert_eq!(f.type_name, "int[][]"),
            other => panic!("unexpected {:?}", other),
        }

        let service = find(&unit, "UserService");
        match service.children.iter().map(|&c| &unit.tree.get(c).kind).nth(4) {
            Some(DeclKind::Constructor(ctor)) => {
                assert_eq!(ctor.params.len(), 1);
                assert_eq!(ctor.params[0].type_name, "Repository");
                assert_eq!(ctor.throws, vec!["IOException"]);
                assert!(ctor.body.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }

        match &find(&unit, "find").kind {
            DeclKind::Method(m) => {
                assert_eq!(m.return_type, "T");
                assert_eq!(m.type_params.as_deref(), Some("<T>"));
                assert_eq!(m.params.len(), 2);
                assert!(m.params[1].varargs);
                assert_eq!(m.params[1].type_name, "int");
                assert_eq!(m.throws, vec!["UserNotFoundException", "IOException"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &find(&unit, "names").kind {
            DeclKind::Method(m) => {
                assert_eq!(m.return_type, "String[][]");
                assert!(m.body.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_constructor_name_mismatch_is_partial() {
        let unit = parse_java(
            r#"
class Person {
    Persn(String name) {}
    void ok() {}
}
"#,
        );
        assert_eq!(unit.diagnostics.len(), 1);
        let diag = unit.diagnostics.iter().next().unwrap();
        assert_eq!(diag.message, "invalid method declaration; return type required");
        let ctor = find(&unit, "Persn");
        assert!(matches!(ctor.kind, DeclKind::Constructor(_)));
        assert!(ctor.partial);
        assert_eq!(ctor.diagnostics, vec![diag.id]);
        assert!(!find(&unit, "ok").partial);
    }

    #[test]
    fn test_enum_constants_with_arguments_and_bodies() {
        let unit = parse_java(
            r#"
public enum Planet implements Body {
    MERCURY(3.303e+23, 2.4397e6),
    EARTH(5.976e+24, 6.37814e6) {
        @Override
        double gravity() { return 9.8; }
    };

    private final double mass;

    Planet(double mass, double radius) {
        this.mass = mass;
    }

    double gravity() { return 0; }
}
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let earth = find(&unit, "EARTH");
        match &earth.kind {
            DeclKind::EnumConstant(c) => {
                assert_eq!(c.arguments.as_deref(), Some("5.976e+24, 6.37814e6"));
                assert!(c.body.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(earth.children.len(), 1);
        let gravity = unit.tree.get(earth.children[0]);
        assert!(gravity.is_override);
        let names: Vec<_> = find(&unit, "Planet")
            .children
            .iter()
            .map(|&c| unit.tree.get(c).name.as_str())
            .collect();
        assert_eq!(names, vec!["MERCURY", "EARTH", "mass", "Planet", "gravity"]);
    }

    #[test]
    fn test_simple_enum_without_semicolon() {
        let unit = parse_java("enum Color { RED, GREEN, BLUE, }");
        assert!(unit.diagnostics.is_empty());
        assert_eq!(find(&unit, "Color").children.len(), 3);
    }

    #[test]
    fn test_records_and_compact_constructors() {
        let unit = parse_java(
            r#"
public record Point(int x, @NonNull Integer y) implements Comparable<Point> {
    public Point {
        if (x < 0) throw new IllegalArgumentException();
    }
    static Point origin() { return new Point(0, 0); }
}
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let point = find(&unit, "Point");
        assert_eq!(point.type_kind(), Some(TypeKind::Record));
        let kinds: Vec<_> = point
            .children
            .iter()
            .map(|&c| unit.tree.get(c))
            .map(|n| match &n.kind {
                DeclKind::Field(f) if f.component => "component",
                DeclKind::Constructor(_) => "constructor",
                DeclKind::Method(_) => "method",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["component", "component", "constructor", "method"]);
    }

    #[test]
    fn test_annotation_type_elements() {
        let unit = parse_java(
            r#"
@Retention(RetentionPolicy.RUNTIME)
public @interface Route {
    String value();
    String[] methods() default {"GET"};
    int priority() default 0;
}
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let route = find(&unit, "Route");
        assert_eq!(route.type_kind(), Some(TypeKind::Annotation));
        assert_eq!(route.annotations[0].name, "Retention");
        assert_eq!(
            route.annotations[0].arguments.as_deref(),
            Some("RetentionPolicy.RUNTIME")
        );
        match &find(&unit, "methods").kind {
            DeclKind::Method(m) => assert_eq!(m.default_value.as_deref(), Some("{\"GET\"}")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_initializer_blocks_and_anonymous_classes_are_skipped() {
        let unit = parse_java(
            r#"
class Registry {
    static final Map<String, Integer> IDS = new HashMap<>();
    static {
        IDS.put("a", 1);
    }
    {
        count = 0;
    }
    Runnable task = new Runnable() {
        public void run() { System.out.println("hi"); }
    };
    Comparator<String> cmp = (a, b) -> { return a.compareTo(b); };
    int count;
}
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let names: Vec<_> = find(&unit, "Registry")
            .children
            .iter()
            .map(|&c| unit.tree.get(c).name.as_str())
            .collect();
        assert_eq!(names, vec!["IDS", "task", "cmp", "count"]);
    }

    #[test]
    fn test_doc_comments_attach_to_next_declaration() {
        let unit = parse_java(
            r#"
/**
 * A greeter.
 */
@Deprecated
public class Greeter {
    /** Says hello. */
    public String greet(String name) { return "Hello, " + name; }

    // not a doc comment
    int plain;
}
"#,
        );
        assert_eq!(find(&unit, "Greeter").doc.as_deref(), Some("A greeter."));
        assert_eq!(find(&unit, "greet").doc.as_deref(), Some("Says hello."));
        assert_eq!(find(&unit, "plain").doc, None);
    }

    #[test]
    fn test_nested_types_preserve_member_order() {
        let unit = parse_java(
            r#"
class Outer {
    int a;
    static class Inner {
        interface Deep {}
    }
    void b() {}
}
"#,
        );
        let outer = find(&unit, "Outer");
        let names: Vec<_> = outer
            .children
            .iter()
            .map(|&c| unit.tree.get(c).name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "Inner", "b"]);
        let inner = find(&unit, "Inner");
        assert_eq!(inner.parent, Some(outer.id));
        assert!(outer.span.contains(inner.span));
        assert!(inner.span.contains(find(&unit, "Deep").span));
    }

    #[test]
    fn test_class_extending_two_types() {
        let unit = parse_java("class A extends B, C {}");
        assert_eq!(unit.diagnostics.len(), 1);
        let a = find(&unit, "A");
        assert!(a.partial);
        assert_eq!(a.type_decl().unwrap().superclass.as_deref(), Some("B"));
    }

    #[test]
    fn test_method_at_file_level_is_rejected() {
        let unit = parse_java("public void orphan() { }\nclass Kept {}\n");
        assert_eq!(unit.diagnostics.len(), 1);
        assert!(unit.diagnostics.iter().next().unwrap().message.contains("type declaration"));
        assert_eq!(unit.tree.nodes().count(), 1);
        assert_eq!(find(&unit, "Kept").name, "Kept");
    }
}
