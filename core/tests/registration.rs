use modreg_core::patcher::{DiskTree, OverlayTree, Tree};
use modreg_core::{add_unit_to_module, AppError, RegistrationOptions, RegistrationStatus};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const CORE_MODULE: &str =
    "@NgModule({ imports: [CommonModule], declarations: [], exports: [] }) export class CoreModule {}";

const APP_MODULE: &str = r#"import { NgModule } from '@angular/core';
import { BrowserModule } from '@angular/platform-browser';

import { AppComponent } from './app.component';

@NgModule({
  declarations: [
    AppComponent,
  ],
  imports: [
    BrowserModule,
  ],
  bootstrap: [AppComponent]
})
export class AppModule { }
"#;

fn source_dir(root: &Path) -> String {
    root.join("src").to_string_lossy().replace('\\', "/")
}

fn write(root: &Path, rel: &str, content: &str) -> std::path::PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn options(root: &Path, path: &str, export: bool) -> RegistrationOptions {
    let mut options = RegistrationOptions::new("side-menu", source_dir(root));
    options.path = path.into();
    options.export = export;
    options
}

#[test]
fn registers_declaration_and_export() {
    let dir = tempdir().unwrap();
    let module = write(dir.path(), "src/app/core/core.module.ts", CORE_MODULE);

    let outcomes = add_unit_to_module(&mut DiskTree, &options(dir.path(), "app/core", true)).unwrap();
    assert_eq!(outcomes.len(), 2);

    let out = fs::read_to_string(&module).unwrap();
    assert_eq!(
        out,
        "import { SideMenuComponent } from './side-menu/side-menu.component';\n\
         @NgModule({ imports: [CommonModule], declarations: [SideMenuComponent], exports: [SideMenuComponent] }) export class CoreModule {}"
    );
}

#[test]
fn registers_declaration_only_without_export_flag() {
    let dir = tempdir().unwrap();
    let module = write(dir.path(), "src/app/core/core.module.ts", CORE_MODULE);

    let outcomes =
        add_unit_to_module(&mut DiskTree, &options(dir.path(), "app/core", false)).unwrap();
    assert_eq!(outcomes.len(), 1);

    let out = fs::read_to_string(&module).unwrap();
    assert!(out.starts_with("import { SideMenuComponent } from './side-menu/side-menu.component';\n"));
    assert!(out.contains("declarations: [SideMenuComponent]"));
    assert!(out.contains("exports: []"));
}

#[test]
fn keeps_multi_line_layout() {
    let dir = tempdir().unwrap();
    let module = write(dir.path(), "src/app/app.module.ts", APP_MODULE);

    add_unit_to_module(&mut DiskTree, &options(dir.path(), "app", true)).unwrap();

    let expected = r#"import { NgModule } from '@angular/core';
import { BrowserModule } from '@angular/platform-browser';

import { AppComponent } from './app.component';
import { SideMenuComponent } from './side-menu/side-menu.component';

@NgModule({
  exports: [SideMenuComponent],
  declarations: [
    AppComponent,
    SideMenuComponent,
  ],
  imports: [
    BrowserModule,
  ],
  bootstrap: [AppComponent]
})
export class AppModule { }
"#;
    assert_eq!(fs::read_to_string(&module).unwrap(), expected);
}

#[test]
fn second_run_changes_nothing() {
    let dir = tempdir().unwrap();
    let module = write(dir.path(), "src/app/app.module.ts", APP_MODULE);
    let opts = options(dir.path(), "app", true);

    add_unit_to_module(&mut DiskTree, &opts).unwrap();
    let first = fs::read_to_string(&module).unwrap();

    let outcomes = add_unit_to_module(&mut DiskTree, &opts).unwrap();
    assert!(outcomes
        .iter()
        .all(|o| o.status == RegistrationStatus::AlreadyPresent));
    assert_eq!(fs::read_to_string(&module).unwrap(), first);
}

#[test]
fn skips_routing_module_when_locating() {
    let dir = tempdir().unwrap();
    let routing = write(
        dir.path(),
        "src/app/shop/shop-routing.module.ts",
        "@NgModule({ imports: [] }) export class ShopRoutingModule {}",
    );
    let shop = write(
        dir.path(),
        "src/app/shop/shop.module.ts",
        "@NgModule({ declarations: [] }) export class ShopModule {}",
    );

    add_unit_to_module(&mut DiskTree, &options(dir.path(), "app/shop", false)).unwrap();

    assert!(fs::read_to_string(&shop)
        .unwrap()
        .contains("declarations: [SideMenuComponent]"));
    assert_eq!(
        fs::read_to_string(&routing).unwrap(),
        "@NgModule({ imports: [] }) export class ShopRoutingModule {}"
    );
}

#[test]
fn missing_module_reports_error() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src/app")).unwrap();

    let err = add_unit_to_module(&mut DiskTree, &options(dir.path(), "app", false)).unwrap_err();
    assert!(matches!(err, AppError::ModuleNotFound(_)));
}

#[test]
fn explicit_module_that_does_not_exist() {
    let dir = tempdir().unwrap();
    write(dir.path(), "src/app/app.module.ts", APP_MODULE);
    let mut opts = options(dir.path(), "app", false);
    opts.module = Some("missing".into());

    let err = add_unit_to_module(&mut DiskTree, &opts).unwrap_err();
    assert!(matches!(err, AppError::FileNotFound(_)));
}

#[test]
fn malformed_descriptor_is_left_untouched() {
    let dir = tempdir().unwrap();
    let broken = "import { A } from './a';\n@NgModule({ declarations: [A }) export class M {}";
    let module = write(dir.path(), "src/app/app.module.ts", broken);

    let err = add_unit_to_module(&mut DiskTree, &options(dir.path(), "app", true)).unwrap_err();
    assert!(matches!(err, AppError::Parse(_)));
    assert_eq!(fs::read_to_string(&module).unwrap(), broken);
}

#[test]
fn dry_run_overlay_does_not_write() {
    let dir = tempdir().unwrap();
    let module = write(dir.path(), "src/app/core/core.module.ts", CORE_MODULE);

    let mut overlay = OverlayTree::new(DiskTree);
    add_unit_to_module(&mut overlay, &options(dir.path(), "app/core", true)).unwrap();

    assert_eq!(fs::read_to_string(&module).unwrap(), CORE_MODULE);
    let changes: Vec<_> = overlay.changes().collect();
    assert_eq!(changes.len(), 1);
    assert!(changes[0].1.contains("exports: [SideMenuComponent]"));
    assert_eq!(
        overlay.read(&module.to_string_lossy()).unwrap(),
        changes[0].1
    );
}
