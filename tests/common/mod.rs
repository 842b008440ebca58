//! Common test utilities and fixtures for component-catalog integration tests
//!
//! This module provides:
//! - `TestRepo` builder for creating throwaway component projects on disk
//! - Fixture sources for a small design system

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary project directory
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root, creating parent directories
    pub fn add_file(&self, rel: &str, content: &str) -> &Self {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write fixture");
        self
    }

    pub fn remove_file(&self, rel: &str) -> &Self {
        fs::remove_file(self.dir.path().join(rel)).expect("remove fixture");
        self
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// A small design system: two atoms, a molecule, a helper, a theme and
    /// the category table
    pub fn design_system() -> Self {
        let repo = Self::new();
        repo.add_file("catalog.config.json5", CATALOG_CONFIG)
            .add_file("src/atoms/Button.tsx", BUTTON_V1)
            .add_file("src/atoms/Icon.tsx", ICON)
            .add_file("src/molecules/SearchBar.tsx", SEARCH_BAR)
            .add_file("src/lib/format.ts", FORMAT_HELPER)
            .add_file("src/atoms/Button.test.tsx", BUTTON_TEST)
            .add_file("tailwind.config.js", TAILWIND_CONFIG);
        repo
    }
}

pub const CATALOG_CONFIG: &str = r#"{
  categories: {
    atoms: ["Button", "Icon", "Badge"],
    molecules: ["SearchBar"],
  },
}
"#;

pub const BUTTON_V1: &str = r#"import { cn } from "@/lib/cn";
import { Icon } from "./Icon";

export interface ButtonProps {
  label: string;
  icon?: string;
  variant?: "primary" | "ghost";
}

export function Button({ label, icon, variant = "primary" }: ButtonProps) {
  return (
    <button className={cn("px-4 py-2 bg-blue-500", variant === "ghost" && "bg-transparent")}>
      {icon && <Icon name={icon} />}
      {label}
    </button>
  );
}
"#;

pub const BUTTON_V2: &str = r#"import { cn } from "@/lib/cn";
import { Icon } from "./Icon";

export interface ButtonProps {
  label: string;
  icon?: string;
  variant?: "primary" | "ghost";
}

export function Button({ label, icon, variant = "primary" }: ButtonProps) {
  return (
    <button className={cn("px-4 py-2 bg-blue-600", variant === "ghost" && "bg-transparent")}>
      {icon && <Icon name={icon} />}
      {label}
    </button>
  );
}
"#;

pub const ICON: &str = r#"export const Icon = ({ name, size = 16 }: { name: string; size?: number }) => (
  <svg className="inline-block text-brand-500" width={size} height={size} data-icon={name} />
);
"#;

pub const SEARCH_BAR: &str = r#"import { Button } from "../atoms/Button";

type SearchBarProps = { placeholder?: string; onSearch: (q: string) => void };

export default function SearchBar({ placeholder = "Search", onSearch }: SearchBarProps) {
  return (
    <form className="flex items-center gap-2" onSubmit={onSearch}>
      <input className="border rounded px-2" placeholder={placeholder} />
      <Button label="Go" />
    </form>
  );
}
"#;

pub const FORMAT_HELPER: &str = r#"export function formatPrice(cents: number): string {
  return `$${(cents / 100).toFixed(2)}`;
}
"#;

pub const BUTTON_TEST: &str = r#"import { Button } from "./Button";
export function ButtonHarness() { return <Button label="x" />; }
"#;

pub const TAILWIND_CONFIG: &str = r##"/** @type {import('tailwindcss').Config} */
module.exports = {
  content: ["./src/**/*.{ts,tsx}"],
  theme: {
    colors: { brand: { 500: "#0ea5e9", 700: "#0369a1" }, white: "#fff" },
    extend: {
      colors: { brand: { 500: "#38bdf8" } },
      spacing: { 18: "4.5rem" },
    },
  },
};
"##;
