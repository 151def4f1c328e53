//! Descriptive call signatures for factories and synthesized asset methods.
//!
//! Signatures never affect invocation; they exist so that tooling can show which
//! fields a factory accepts without knowing the concrete types.

use std::fmt;

/// A constructible field declared by an asset or datasource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
	pub name: &'static str,
	pub annotation: &'static str,
	/// Rendered default value; `None` means the field is required.
	pub default: Option<&'static str>,
}

impl FieldSpec {
	pub const fn required(name: &'static str, annotation: &'static str) -> Self {
		Self {
			name,
			annotation,
			default: None,
		}
	}

	pub const fn optional(
		name: &'static str,
		annotation: &'static str,
		default: &'static str,
	) -> Self {
		Self {
			name,
			annotation,
			default: Some(default),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
	Positional,
	KeywordOnly,
	/// Catch-all for extra keyword fields.
	VarKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
	pub name: String,
	pub kind: ParamKind,
	pub annotation: Option<String>,
	pub default: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
	params: Vec<Param>,
	returns: Option<String>,
}

impl Signature {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn positional(mut self, name: &str, annotation: &str) -> Self {
		self.push(name, ParamKind::Positional, Some(annotation), None);
		self
	}

	pub fn optional_positional(mut self, name: &str, annotation: &str, default: &str) -> Self {
		self.push(name, ParamKind::Positional, Some(annotation), Some(default));
		self
	}

	pub fn var_keyword(mut self, name: &str) -> Self {
		self.push(name, ParamKind::VarKeyword, None, None);
		self
	}

	pub fn returns(mut self, annotation: &str) -> Self {
		self.returns = Some(annotation.to_string());
		self
	}

	pub fn params(&self) -> &[Param] {
		&self.params
	}

	pub fn param_names(&self) -> Vec<&str> {
		self.params.iter().map(|p| p.name.as_str()).collect()
	}

	pub fn return_annotation(&self) -> Option<&str> {
		self.returns.as_deref()
	}

	/// Adds `fields` as keyword-only parameters ahead of any var-keyword parameter.
	///
	/// Fields named in `exclude` and fields that collide with an existing parameter
	/// are skipped.
	pub fn merge_fields(mut self, fields: &[FieldSpec], exclude: &[&str]) -> Self {
		let insert_at = self
			.params
			.iter()
			.position(|p| p.kind == ParamKind::VarKeyword)
			.unwrap_or(self.params.len());

		let merged: Vec<Param> = fields
			.iter()
			.filter(|f| !exclude.contains(&f.name))
			.filter(|f| !self.params.iter().any(|p| p.name == f.name))
			.map(|f| Param {
				name: f.name.to_string(),
				kind: ParamKind::KeywordOnly,
				annotation: Some(f.annotation.to_string()),
				default: f.default.map(str::to_string),
			})
			.collect();

		self.params.splice(insert_at..insert_at, merged);
		self
	}

	fn push(&mut self, name: &str, kind: ParamKind, annotation: Option<&str>, default: Option<&str>) {
		self.params.push(Param {
			name: name.to_string(),
			kind,
			annotation: annotation.map(str::to_string),
			default: default.map(str::to_string),
		});
	}
}

impl fmt::Display for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("(")?;
		let mut keyword_marker = false;
		for (i, param) in self.params.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			match param.kind {
				ParamKind::KeywordOnly if !keyword_marker => {
					keyword_marker = true;
					f.write_str("*, ")?;
				}
				ParamKind::VarKeyword => {
					keyword_marker = true;
					f.write_str("**")?;
				}
				_ => {}
			}
			f.write_str(&param.name)?;
			if let Some(annotation) = &param.annotation {
				write!(f, ": {annotation}")?;
			}
			if let Some(default) = &param.default {
				write!(f, " = {default}")?;
			}
		}
		f.write_str(")")?;
		if let Some(returns) = &self.returns {
			write!(f, " -> {returns}")?;
		}
		Ok(())
	}
}
