extern crate proc_macro;

use darling::FromField;
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use proc_macro_crate::{crate_name, FoundCrate};
use proc_macro_error::{abort, proc_macro_error};
use quote::quote;
use syn::{
	braced,
	ext::IdentExt,
	parse::{Nothing, Parse, ParseStream},
	parse_macro_input,
	punctuated::Punctuated,
	token::{Brace, Comma},
	Attribute, Error, Field, Ident, Lit, Meta, NestedMeta, Result, Token, Visibility,
};

/// Declares entity structs together with their table mapping.
///
/// ```ignore
/// entity!(
/// 	#[table(name = "accounts", primary_keys("id"), indexes("email"), options(comment = "users"))]
/// 	pub Account {
/// 		#[column(cql_type = "uuid")]
/// 		id: Uuid,
/// 		#[column(name = "email_address", cql_type = "text")]
/// 		email: String,
/// 		transient: bool,
/// 	}
/// );
/// ```
///
/// Every invocation also defines `ENTITIES`, a registry of the declared entities.
#[proc_macro]
#[proc_macro_error]
pub fn entity(input: TokenStream) -> TokenStream {
	let orm = find_crate("cassandra-orm");

	let entities = parse_macro_input!(input as Entities);

	let mut outputs = vec![];
	let mut idents = vec![];

	for entity in entities.0 {
		let fields = entity.fields.iter().map(|field| &field.field);
		let with_fields = entity.fields.iter().map(|field| {
			let field_name = field.ident.unraw().to_string();
			let column = match &field.column {
				Some(ColumnSpec { name, cql_type }) => {
					quote! { Some(#orm::entity_meta::ColumnDeclaration::new(#name, #cql_type)) }
				},
				None => quote! { None },
			};
			quote! { .with_field(#field_name, #column) }
		});
		let with_table = entity.table.as_ref().map(|table| {
			let table = table.to_declaration(&orm);
			quote! { let declaration = declaration.with_table(#table); }
		});

		let attrs = &entity.attrs;
		let vis = &entity.vis;
		let ident = &entity.ident;
		let short_name = ident.to_string();

		outputs.push(quote! {
			#(#attrs)*
			#vis struct #ident {
				#(#fields),*
			}
			impl #orm::Entity for #ident {
				fn declaration() -> #orm::entity_meta::EntityDeclaration {
					let declaration = #orm::entity_meta::EntityDeclaration::new(module_path!(), #short_name, file!());
					#with_table
					declaration #(#with_fields)*
				}
			}
		});

		idents.push(entity.ident);
	}

	quote! {
		#orm::lazy_static::lazy_static! {
			pub static ref ENTITIES: #orm::EntityRegistry = #orm::EntityRegistry::new(vec![
				#(<#idents as #orm::Entity>::declaration()),*
			]);
		}

		#(#outputs)*
	}
	.into()
}

struct Entities(Punctuated<Entity, Nothing>);
impl Parse for Entities {
	fn parse(input: ParseStream) -> Result<Self> {
		Ok(Entities(input.parse_terminated(Entity::parse)?))
	}
}

struct Entity {
	attrs: Vec<Attribute>,
	table: Option<TableSpec>,
	vis: Visibility,
	ident: Ident,
	_brace_token: Brace,
	fields: Vec<EntityField>,
}
impl Parse for Entity {
	fn parse(input: ParseStream) -> Result<Self> {
		let content;

		let attrs = input.call(Attribute::parse_outer)?;
		let vis = input.parse()?;
		let ident = input.parse()?;
		let _brace_token = braced!(content in input);
		let fields = content.parse_terminated::<_, Token![,]>(Field::parse_named)?;
		let fields = fields.into_iter().map(EntityField::new).collect::<Result<Vec<_>>>()?;

		let (table_attrs, attrs): (Vec<_>, Vec<_>) = attrs.into_iter().partition(|attr| attr.path.is_ident("table"));
		let table = match table_attrs.as_slice() {
			[] => None,
			[attr] => Some(TableSpec::from_attribute(attr)?),
			[_, extra, ..] => return Err(Error::new_spanned(extra, "duplicate #[table] attribute")),
		};

		Ok(Entity { attrs, table, vis, ident, _brace_token, fields })
	}
}

#[derive(FromField)]
#[darling(attributes(column))]
struct ColumnAttr {
	ident: Option<Ident>,
	#[darling(default)]
	name: Option<String>,
	#[darling(default)]
	cql_type: Option<String>,
}

struct ColumnSpec {
	name: String,
	cql_type: String,
}

struct EntityField {
	ident: Ident,
	/// The field as it goes into the generated struct, `#[column]` removed.
	field: Field,
	column: Option<ColumnSpec>,
}
impl EntityField {
	fn new(mut field: Field) -> Result<Self> {
		let has_column = field.attrs.iter().any(|attr| attr.path.is_ident("column"));
		let attr = ColumnAttr::from_field(&field).map_err(|e| Error::new_spanned(&field, e.to_string()))?;
		let ident = attr.ident.clone().ok_or_else(|| Error::new_spanned(&field, "entity fields must be named"))?;

		let column = if has_column {
			let cql_type = attr
				.cql_type
				.ok_or_else(|| Error::new_spanned(&field, "#[column] requires a `cql_type`, e.g. cql_type = \"text\""))?;
			Some(ColumnSpec { name: attr.name.unwrap_or_else(|| ident.unraw().to_string()), cql_type })
		} else {
			None
		};

		field.attrs.retain(|attr| !attr.path.is_ident("column"));
		Ok(Self { ident, field, column })
	}
}

enum KeyPartSpec {
	Column(String),
	Composite(Vec<String>),
}

enum OptionLit {
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
}

#[derive(Default)]
struct TableSpec {
	repository_class: Option<String>,
	name: Option<String>,
	indexes: Option<Vec<String>>,
	primary_keys: Option<Vec<KeyPartSpec>>,
	default_ttl: Option<u32>,
	if_not_exists: Option<bool>,
	options: Vec<(String, OptionLit)>,
}
impl TableSpec {
	fn from_attribute(attr: &Attribute) -> Result<Self> {
		let mut table = TableSpec::default();
		let list = match attr.parse_meta()? {
			Meta::List(list) => list,
			Meta::Path(_) => return Ok(table),
			meta => return Err(Error::new_spanned(meta, "expected #[table] or #[table(...)]")),
		};

		for nested in list.nested {
			let meta = match nested {
				NestedMeta::Meta(meta) => meta,
				NestedMeta::Lit(lit) => return Err(Error::new_spanned(lit, "expected a table setting")),
			};
			let key = meta.path().get_ident().map(ToString::to_string).unwrap_or_default();
			match (key.as_str(), meta) {
				("name", Meta::NameValue(nv)) => table.name = Some(lit_str(&nv.lit)?),
				("repository_class", Meta::NameValue(nv)) => table.repository_class = Some(lit_str(&nv.lit)?),
				("default_ttl", Meta::NameValue(nv)) => table.default_ttl = Some(lit_u32(&nv.lit)?),
				("if_not_exists", Meta::Path(_)) => table.if_not_exists = Some(true),
				("if_not_exists", Meta::NameValue(nv)) => table.if_not_exists = Some(lit_bool(&nv.lit)?),
				("indexes", Meta::List(list)) => table.indexes = Some(str_list(&list.nested)?),
				("primary_keys", Meta::List(list)) => {
					table.primary_keys = Some(list.nested.iter().map(key_part).collect::<Result<_>>()?)
				},
				("options", Meta::List(list)) => {
					for option in &list.nested {
						table.options.push(table_option(option)?);
					}
				},
				(_, meta) => return Err(Error::new_spanned(meta, format!("unknown table setting `{}`", key))),
			}
		}

		Ok(table)
	}

	fn to_declaration(&self, orm: &TokenStream2) -> TokenStream2 {
		let mut settings = vec![];
		if let Some(name) = &self.name {
			settings.push(quote! { table.name = Some(#name.to_string()); });
		}
		if let Some(repository_class) = &self.repository_class {
			settings.push(quote! { table.repository_class = Some(#repository_class.to_string()); });
		}
		if let Some(indexes) = &self.indexes {
			settings.push(quote! { table.indexes = vec![#(#indexes.to_string()),*]; });
		}
		if let Some(primary_keys) = &self.primary_keys {
			let parts = primary_keys.iter().map(|part| match part {
				KeyPartSpec::Column(column) => quote! { #orm::entity_meta::KeyPart::Column(#column.to_string()) },
				KeyPartSpec::Composite(columns) => {
					quote! { #orm::entity_meta::KeyPart::Composite(vec![#(#columns.to_string()),*]) }
				},
			});
			settings.push(quote! { table.primary_keys = vec![#(#parts),*]; });
		}
		if let Some(default_ttl) = self.default_ttl {
			settings.push(quote! { table.default_ttl = Some(#default_ttl); });
		}
		if let Some(if_not_exists) = self.if_not_exists {
			settings.push(quote! { table.if_not_exists = Some(#if_not_exists); });
		}
		for (option, value) in &self.options {
			let value = match value {
				OptionLit::Bool(b) => quote! { #orm::table_options::OptionValue::Bool(#b) },
				OptionLit::Int(i) => quote! { #orm::table_options::OptionValue::Int(#i) },
				OptionLit::Float(f) => quote! { #orm::table_options::OptionValue::Float(#f) },
				OptionLit::Str(s) => quote! { #orm::table_options::OptionValue::Text(#s.to_string()) },
			};
			settings.push(quote! { table.table_options.push((#option.to_string(), #value)); });
		}

		quote! {{
			let mut table = #orm::entity_meta::TableDeclaration::default();
			#(#settings)*
			table
		}}
	}
}

fn key_part(nested: &NestedMeta) -> Result<KeyPartSpec> {
	match nested {
		NestedMeta::Lit(lit) => Ok(KeyPartSpec::Column(lit_str(lit)?)),
		NestedMeta::Meta(Meta::List(list)) if list.path.is_ident("partition") => {
			Ok(KeyPartSpec::Composite(str_list(&list.nested)?))
		},
		other => Err(Error::new_spanned(other, "expected a column name or partition(\"a\", \"b\")")),
	}
}

fn table_option(nested: &NestedMeta) -> Result<(String, OptionLit)> {
	let (path, value) = match nested {
		NestedMeta::Meta(Meta::NameValue(nv)) => {
			let value = match &nv.lit {
				Lit::Bool(b) => OptionLit::Bool(b.value),
				Lit::Int(i) => OptionLit::Int(i.base10_parse()?),
				Lit::Float(f) => OptionLit::Float(f.base10_parse()?),
				Lit::Str(s) => OptionLit::Str(s.value()),
				lit => return Err(Error::new_spanned(lit, "unsupported option value")),
			};
			(&nv.path, value)
		},
		NestedMeta::Meta(Meta::Path(path)) => (path, OptionLit::Bool(true)),
		other => return Err(Error::new_spanned(other, "expected `option = value`")),
	};
	let name = path.get_ident().ok_or_else(|| Error::new_spanned(path, "expected an option name"))?;
	Ok((name.to_string(), value))
}

fn str_list(nested: &Punctuated<NestedMeta, Comma>) -> Result<Vec<String>> {
	nested
		.iter()
		.map(|nested| match nested {
			NestedMeta::Lit(lit) => lit_str(lit),
			other => Err(Error::new_spanned(other, "expected a string literal")),
		})
		.collect()
}

fn lit_str(lit: &Lit) -> Result<String> {
	match lit {
		Lit::Str(s) => Ok(s.value()),
		other => Err(Error::new_spanned(other, "expected a string literal")),
	}
}

fn lit_u32(lit: &Lit) -> Result<u32> {
	match lit {
		Lit::Int(i) => i.base10_parse(),
		other => Err(Error::new_spanned(other, "expected an integer")),
	}
}

fn lit_bool(lit: &Lit) -> Result<bool> {
	match lit {
		Lit::Bool(b) => Ok(b.value),
		other => Err(Error::new_spanned(other, "expected `true` or `false`")),
	}
}

fn find_crate(name: &str) -> TokenStream2 {
	match crate_name(name) {
		Ok(x) => match x {
			FoundCrate::Itself => quote!(crate),
			FoundCrate::Name(name) => {
				let ident = Ident::new(&name, Span::call_site());
				quote!(#ident)
			},
		},
		Err(_) => abort!(Span::call_site(), "{} is not present in `Cargo.toml`", name),
	}
}
