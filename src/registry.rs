use crate::entity_meta::EntityDeclaration;
use log::warn;
use std::collections::HashMap;

/// Where the metadata factory reads entity declarations from.
pub trait DeclarationSource {
	fn declaration(&self, class_name: &str) -> Option<&EntityDeclaration>;

	/// Maps a generated subclass (e.g. a proxy) to the class that carries the declaration.
	fn real_class_name(&self, class_name: &str) -> String {
		class_name.to_string()
	}
}

/// Entity declarations compiled into the application, in registration order.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
	declarations: Vec<EntityDeclaration>,
	by_name: HashMap<String, usize>,
	real_classes: HashMap<String, String>,
}
impl EntityRegistry {
	pub fn new(declarations: Vec<EntityDeclaration>) -> Self {
		let mut registry = Self::default();
		for declaration in declarations {
			registry.register(declaration);
		}
		registry
	}

	pub fn merge<'a>(registries: impl IntoIterator<Item = &'a EntityRegistry>) -> Self {
		let mut merged = Self::default();
		for registry in registries {
			for declaration in &registry.declarations {
				merged.register(declaration.clone());
			}
			merged.real_classes.extend(registry.real_classes.iter().map(|(k, v)| (k.clone(), v.clone())));
		}
		merged
	}

	/// A second declaration under the same canonical name replaces the first.
	pub fn register(&mut self, declaration: EntityDeclaration) {
		let name = declaration.canonical_name();
		match self.by_name.get(&name) {
			Some(&idx) => {
				warn!("entity {} declared twice, keeping {}", name, declaration.source_file);
				self.declarations[idx] = declaration;
			},
			None => {
				self.by_name.insert(name, self.declarations.len());
				self.declarations.push(declaration);
			},
		}
	}

	pub fn register_subclass(&mut self, class_name: impl Into<String>, real_class_name: impl Into<String>) {
		self.real_classes.insert(class_name.into(), real_class_name.into());
	}

	pub fn declarations(&self) -> &[EntityDeclaration] {
		&self.declarations
	}

	pub fn len(&self) -> usize {
		self.declarations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.declarations.is_empty()
	}
}
impl DeclarationSource for EntityRegistry {
	fn declaration(&self, class_name: &str) -> Option<&EntityDeclaration> {
		self.by_name.get(class_name).map(|&idx| &self.declarations[idx])
	}

	fn real_class_name(&self, class_name: &str) -> String {
		self.real_classes.get(class_name).cloned().unwrap_or_else(|| class_name.to_string())
	}
}
