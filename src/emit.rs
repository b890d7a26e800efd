//! Layer-agnostic builder for a single class, interface or enum artifact.
//!
//! Generation rules mutate one [`TypeWriter`] per artifact and then call
//! [`TypeWriter::render`]. Structural additions are idempotent: writing the
//! same import, base type, backing field or notification scaffolding twice
//! has no further effect, so rules can be composed without coordination.

use crate::error::GenerateError;
use crate::naming;

const INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

impl Access {
    fn keyword(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modifier {
    #[default]
    None,
    Virtual,
    Override,
    Static,
}

#[derive(Debug, Clone)]
struct Dependency {
    type_name: String,
    name: String,
    forward_to_base: bool,
}

#[derive(Debug, Clone)]
struct Hook {
    type_name: String,
    fallback: String,
    name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub type_name: String,
    pub name: String,
    pub access: Access,
    pub value: Option<String>,
    pub readonly: bool,
}

impl FieldDecl {
    pub fn new(type_name: &str, name: &str) -> Self {
        FieldDecl {
            type_name: type_name.to_string(),
            name: name.to_string(),
            access: Access::Private,
            value: None,
            readonly: false,
        }
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Property {
    pub type_name: String,
    pub name: String,
    pub value: Option<String>,
    pub full: bool,
    pub is_virtual: bool,
    pub notify: bool,
    pub attributes: Vec<String>,
}

impl Property {
    /// An auto-implemented `{ get; set; }` property.
    pub fn auto(type_name: &str, name: &str) -> Self {
        Property {
            type_name: type_name.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn value(mut self, value: &str) -> Self {
        if !value.is_empty() {
            self.value = Some(value.to_string());
        }
        self
    }

    /// Backs the property with an explicit private field.
    pub fn full(mut self) -> Self {
        self.full = true;
        self
    }

    /// Raises change notifications from the setter. Implies a full property.
    pub fn notify(mut self, notify: bool) -> Self {
        if notify {
            self.notify = true;
            self.full = true;
        }
        self
    }

    pub fn virtual_(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    pub fn attribute(mut self, attribute: &str) -> Self {
        if !attribute.is_empty() {
            self.attributes.push(attribute.to_string());
        }
        self
    }

    pub fn attributes<'a>(mut self, attributes: impl IntoIterator<Item = &'a String>) -> Self {
        for a in attributes {
            self = self.attribute(a);
        }
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Method {
    pub name: String,
    pub return_type: Option<String>,
    pub params: String,
    pub body: Vec<String>,
    pub access: Access,
    pub modifier: Modifier,
    pub is_async: bool,
    pub attributes: Vec<String>,
}

impl Method {
    pub fn new(name: &str) -> Self {
        Method {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn returns(mut self, return_type: &str) -> Self {
        if !return_type.is_empty() {
            self.return_type = Some(return_type.to_string());
        }
        self
    }

    pub fn params(mut self, params: &str) -> Self {
        self.params = params.to_string();
        self
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.body.push(line.into());
        self
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = modifier;
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn attribute(mut self, attribute: &str) -> Self {
        if !attribute.is_empty() {
            self.attributes.push(attribute.to_string());
        }
        self
    }
}

#[derive(Debug, Clone)]
struct EnumMember {
    name: String,
    value: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct TypeWriter {
    kind: TypeKind,
    namespace: String,
    name: String,
    is_partial: bool,
    is_static: bool,
    inheritance: Vec<String>,
    usings: Vec<String>,
    attributes: Vec<String>,
    dependencies: Vec<Dependency>,
    hooks: Vec<Hook>,
    constructor_lines: Vec<String>,
    fields: Vec<FieldDecl>,
    properties: Vec<Property>,
    enum_members: Vec<EnumMember>,
    methods: Vec<Method>,
    notify_scaffolding: bool,
}

impl TypeWriter {
    pub fn new(kind: TypeKind, namespace: &str, name: &str) -> Self {
        TypeWriter {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
            is_partial: kind != TypeKind::Enum,
            is_static: false,
            inheritance: Vec::new(),
            usings: Vec::new(),
            attributes: Vec::new(),
            dependencies: Vec::new(),
            hooks: Vec::new(),
            constructor_lines: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            enum_members: Vec::new(),
            methods: Vec::new(),
            notify_scaffolding: false,
        }
    }

    pub fn class(namespace: &str, name: &str) -> Self {
        Self::new(TypeKind::Class, namespace, name)
    }

    pub fn interface(namespace: &str, name: &str) -> Self {
        Self::new(TypeKind::Interface, namespace, name)
    }

    pub fn enumeration(namespace: &str, name: &str) -> Self {
        Self::new(TypeKind::Enum, namespace, name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_static(&mut self) {
        self.is_static = true;
    }

    pub fn inherit(&mut self, base: &str) {
        if !base.is_empty() && !self.inheritance.iter().any(|b| b == base) {
            self.inheritance.push(base.to_string());
        }
    }

    pub fn write_using(&mut self, namespace: &str) {
        if !namespace.is_empty() && !self.usings.iter().any(|u| u == namespace) {
            self.usings.push(namespace.to_string());
        }
    }

    pub fn write_optional_using(&mut self, namespace: Option<&str>) {
        if let Some(ns) = namespace {
            self.write_using(ns);
        }
    }

    pub fn write_usings<'a>(&mut self, namespaces: impl IntoIterator<Item = &'a String>) {
        for ns in namespaces {
            self.write_using(ns);
        }
    }

    pub fn write_attribute(&mut self, attribute: &str) {
        if !attribute.is_empty() {
            self.attributes.push(attribute.to_string());
        }
    }

    pub fn write_attributes<'a>(&mut self, attributes: impl IntoIterator<Item = &'a String>) {
        for a in attributes {
            self.write_attribute(a);
        }
    }

    /// Injects a constructor dependency stored in a private readonly field.
    pub fn write_dependency(&mut self, type_name: &str, name: &str) {
        self.push_dependency(type_name, name, false);
    }

    /// Injects a constructor dependency that is passed on to the base type.
    pub fn write_base_dependency(&mut self, type_name: &str, name: &str) {
        self.push_dependency(type_name, name, true);
    }

    fn push_dependency(&mut self, type_name: &str, name: &str, forward_to_base: bool) {
        if self.dependencies.iter().any(|d| d.name == name) {
            return;
        }
        self.dependencies.push(Dependency {
            type_name: type_name.to_string(),
            name: name.to_string(),
            forward_to_base,
        });
    }

    /// Registers an optional customization hook. The constructor accepts an
    /// implementation of `type_name` and falls back to `new {fallback}()`.
    /// Returns the member expression callers use to invoke the hook.
    pub fn write_hook(&mut self, type_name: &str, fallback: &str, name: &str) -> String {
        if !self.hooks.iter().any(|h| h.name == name) {
            self.hooks.push(Hook {
                type_name: type_name.to_string(),
                fallback: fallback.to_string(),
                name: name.to_string(),
            });
        }
        format!("this.{}", name)
    }

    pub fn write_constructor_line(&mut self, line: &str) {
        if !line.is_empty() {
            self.constructor_lines.push(line.to_string());
        }
    }

    pub fn write_field(&mut self, field: FieldDecl) {
        if !self.fields.iter().any(|f| f.name == field.name) {
            self.fields.push(field);
        }
    }

    pub fn write_property(&mut self, property: Property) {
        if self.properties.iter().any(|p| p.name == property.name) {
            return;
        }
        if property.full && self.kind == TypeKind::Class {
            let mut backing = FieldDecl::new(&property.type_name, &naming::backing_field(&property.name));
            backing.value = property.value.clone();
            self.write_field(backing);
        }
        if property.notify && self.kind == TypeKind::Class {
            self.add_notify_scaffolding();
        }
        self.properties.push(property);
    }

    pub fn write_enum_member(&mut self, name: &str, value: Option<i64>) {
        if !self.enum_members.iter().any(|m| m.name == name) {
            self.enum_members.push(EnumMember {
                name: name.to_string(),
                value,
            });
        }
    }

    pub fn write_method(&mut self, method: Method) {
        self.methods.push(method);
    }

    pub fn has_notify_scaffolding(&self) -> bool {
        self.notify_scaffolding
    }

    fn add_notify_scaffolding(&mut self) {
        if self.notify_scaffolding {
            return;
        }
        self.notify_scaffolding = true;
        self.write_using("System.ComponentModel");
        self.write_using("System.Runtime.CompilerServices");
        self.write_using(naming::runtime::HOOKS);
        self.inherit("INotifyPropertyChanged");
        self.write_field(
            FieldDecl::new("event PropertyChangedEventHandler?", "PropertyChanged")
                .access(Access::Public),
        );
        let hook = self.write_hook(
            "IPropertyChangeHook",
            "NoPropertyChangeHook",
            "propertyChangeHook",
        );
        self.write_method(
            Method::new("OnPropertyChanging")
                .access(Access::Protected)
                .modifier(Modifier::Virtual)
                .params("object? oldValue, object? newValue, [CallerMemberName] string propertyName = \"\"")
                .line(format!(
                    "{}.OnPropertyChanging(this, oldValue, newValue, propertyName);",
                    hook
                )),
        );
        self.write_method(
            Method::new("OnPropertyChanged")
                .access(Access::Protected)
                .modifier(Modifier::Virtual)
                .params("[CallerMemberName] string propertyName = \"\"")
                .line(format!("{}.OnPropertyChanged(this, propertyName);", hook)),
        );
        self.write_method(
            Method::new("NotifyPropertyChanged")
                .access(Access::Private)
                .params("[CallerMemberName] string propertyName = \"\"")
                .line("this.PropertyChanged?.Invoke(this, new PropertyChangedEventArgs(propertyName));")
                .line("this.OnPropertyChanged(propertyName);"),
        );
    }

    pub fn render(&self) -> Result<String, GenerateError> {
        if self.name.trim().is_empty() {
            return Err(GenerateError::MissingName {
                namespace: self.namespace.clone(),
            });
        }
        if self.namespace.trim().is_empty() {
            return Err(GenerateError::MissingNamespace {
                artifact: self.name.clone(),
            });
        }

        let mut out = String::new();
        out.push_str("// <auto-generated>\n");
        out.push_str("//     Generated by layergen. Manual edits are lost on regeneration.\n");
        out.push_str("// </auto-generated>\n\n");
        out.push_str(&format!("namespace {}\n{{\n", self.namespace));

        let usings = self.ordered_usings();
        for u in &usings {
            line(&mut out, 1, &format!("using {};", u));
        }
        if !usings.is_empty() {
            out.push('\n');
        }

        for a in &self.attributes {
            line(&mut out, 1, &format!("[{}]", a));
        }
        line(&mut out, 1, &self.declaration());
        line(&mut out, 1, "{");

        let sections = [
            self.render_fields(),
            self.render_constructor(),
            self.render_properties(),
            self.render_enum_members(),
            self.render_methods(),
        ];
        let body: Vec<String> = sections.into_iter().filter(|s| !s.is_empty()).collect();
        out.push_str(&body.join("\n"));

        line(&mut out, 1, "}");
        out.push_str("}\n");
        Ok(out)
    }

    fn ordered_usings(&self) -> Vec<&str> {
        let is_system = |u: &&str| *u == "System" || u.starts_with("System.");
        let all: Vec<&str> = self.usings.iter().map(String::as_str).collect();
        let mut ordered: Vec<&str> = all.iter().copied().filter(is_system).collect();
        ordered.extend(all.iter().copied().filter(|u| !is_system(u)));
        ordered
    }

    fn declaration(&self) -> String {
        let mut decl = String::from("public");
        if self.is_static {
            decl.push_str(" static");
        }
        if self.is_partial && self.kind != TypeKind::Enum {
            decl.push_str(" partial");
        }
        decl.push_str(match self.kind {
            TypeKind::Class => " class ",
            TypeKind::Interface => " interface ",
            TypeKind::Enum => " enum ",
        });
        decl.push_str(&self.name);
        if !self.inheritance.is_empty() {
            decl.push_str(" : ");
            decl.push_str(&self.inheritance.join(", "));
        }
        decl
    }

    fn render_fields(&self) -> String {
        let mut out = String::new();
        for d in self.dependencies.iter().filter(|d| !d.forward_to_base) {
            line(&mut out, 2, &format!("private readonly {} {};", d.type_name, d.name));
        }
        for h in &self.hooks {
            line(
                &mut out,
                2,
                &format!("private readonly {} {};", h.type_name, h.name),
            );
        }
        let mut fields: Vec<&FieldDecl> = self.fields.iter().collect();
        fields.sort_by_key(|f| (!f.readonly, f.access));
        for f in fields {
            let mut text = f.access.keyword().to_string();
            if f.readonly {
                text.push_str(" readonly");
            }
            text.push_str(&format!(" {} {}", f.type_name, f.name));
            if let Some(v) = &f.value {
                text.push_str(&format!(" = {}", v));
            }
            text.push(';');
            line(&mut out, 2, &text);
        }
        out
    }

    fn render_constructor(&self) -> String {
        if self.kind != TypeKind::Class
            || self.is_static
            || (self.dependencies.is_empty() && self.hooks.is_empty() && self.constructor_lines.is_empty())
        {
            return String::new();
        }
        let mut params: Vec<String> = self
            .dependencies
            .iter()
            .map(|d| format!("{} {}", d.type_name, d.name))
            .collect();
        params.extend(
            self.hooks
                .iter()
                .map(|h| format!("{}? {} = null", h.type_name, h.name)),
        );

        let mut out = String::new();
        line(&mut out, 2, &format!("public {}({})", self.name, params.join(", ")));
        let forwarded: Vec<&str> = self
            .dependencies
            .iter()
            .filter(|d| d.forward_to_base)
            .map(|d| d.name.as_str())
            .collect();
        if !forwarded.is_empty() {
            line(&mut out, 3, &format!(": base({})", forwarded.join(", ")));
        }
        line(&mut out, 2, "{");
        for d in self.dependencies.iter().filter(|d| !d.forward_to_base) {
            line(&mut out, 3, &format!("this.{0} = {0};", d.name));
        }
        for h in &self.hooks {
            line(
                &mut out,
                3,
                &format!("this.{0} = {0} ?? new {1}();", h.name, h.fallback),
            );
        }
        for l in &self.constructor_lines {
            line(&mut out, 3, l);
        }
        line(&mut out, 2, "}");
        out
    }

    fn render_properties(&self) -> String {
        let rendered: Vec<String> = self.properties.iter().map(|p| self.render_property(p)).collect();
        rendered.join("\n")
    }

    fn render_property(&self, p: &Property) -> String {
        let mut out = String::new();
        for a in &p.attributes {
            line(&mut out, 2, &format!("[{}]", a));
        }
        let prefix = match (self.kind, p.is_virtual) {
            (TypeKind::Interface, _) => String::new(),
            (_, true) => "public virtual ".to_string(),
            (_, false) => "public ".to_string(),
        };
        if p.full && self.kind == TypeKind::Class {
            let backing = naming::backing_field(&p.name);
            line(&mut out, 2, &format!("{}{} {}", prefix, p.type_name, p.name));
            line(&mut out, 2, "{");
            line(&mut out, 3, &format!("get => this.{};", backing));
            if p.notify {
                line(&mut out, 3, "set");
                line(&mut out, 3, "{");
                line(&mut out, 4, &format!("if (Equals(this.{}, value))", backing));
                line(&mut out, 4, "{");
                line(&mut out, 5, "return;");
                line(&mut out, 4, "}");
                out.push('\n');
                line(&mut out, 4, &format!("this.OnPropertyChanging(this.{}, value);", backing));
                line(&mut out, 4, &format!("this.{} = value;", backing));
                line(&mut out, 4, "this.NotifyPropertyChanged();");
                line(&mut out, 3, "}");
            } else {
                line(&mut out, 3, &format!("set => this.{} = value;", backing));
            }
            line(&mut out, 2, "}");
        } else {
            let mut text = format!("{}{} {} {{ get; set; }}", prefix, p.type_name, p.name);
            if let (Some(v), TypeKind::Class) = (&p.value, self.kind) {
                text.push_str(&format!(" = {};", v));
            }
            line(&mut out, 2, &text);
        }
        out
    }

    fn render_enum_members(&self) -> String {
        let mut members: Vec<&EnumMember> = self.enum_members.iter().collect();
        members.sort_by(|a, b| {
            a.value
                .unwrap_or(0)
                .cmp(&b.value.unwrap_or(0))
                .then_with(|| a.name.cmp(&b.name))
        });
        let mut out = String::new();
        for m in members {
            match m.value {
                Some(v) => line(&mut out, 2, &format!("{} = {},", m.name, v)),
                None => line(&mut out, 2, &format!("{},", m.name)),
            }
        }
        out
    }

    fn render_methods(&self) -> String {
        let mut methods: Vec<&Method> = self.methods.iter().collect();
        methods.sort_by_key(|m| m.access);
        let rendered: Vec<String> = methods.into_iter().map(|m| self.render_method(m)).collect();
        rendered.join("\n")
    }

    fn render_method(&self, m: &Method) -> String {
        let mut out = String::new();
        for a in &m.attributes {
            line(&mut out, 2, &format!("[{}]", a));
        }
        let return_type = m.return_type.as_deref().unwrap_or("void");
        if self.kind == TypeKind::Interface {
            line(&mut out, 2, &format!("{} {}({});", return_type, m.name, m.params));
            return out;
        }
        let mut sig = m.access.keyword().to_string();
        match m.modifier {
            Modifier::None => {}
            Modifier::Virtual => sig.push_str(" virtual"),
            Modifier::Override => sig.push_str(" override"),
            Modifier::Static => sig.push_str(" static"),
        }
        if m.is_async {
            sig.push_str(" async");
        }
        sig.push_str(&format!(" {} {}({})", return_type, m.name, m.params));
        line(&mut out, 2, &sig);
        line(&mut out, 2, "{");
        for l in &m.body {
            if l.is_empty() {
                out.push('\n');
            } else {
                line(&mut out, 3, l);
            }
        }
        line(&mut out, 2, "}");
        out
    }
}

fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}
