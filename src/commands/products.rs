use tauri::State;

use crate::models::product::{Product, ProductCreate};

use super::{AppState, CommandResult};

#[tauri::command]
pub async fn products_load(state: State<'_, AppState>) -> CommandResult<Vec<Product>> {
    Ok(state.products().load().await?)
}

#[tauri::command]
pub async fn products_add(
    state: State<'_, AppState>,
    input: ProductCreate,
) -> CommandResult<Vec<Product>> {
    Ok(state.products().add(input).await?)
}

#[tauri::command]
pub async fn products_delete(
    state: State<'_, AppState>,
    id: i64,
    confirmed: bool,
) -> CommandResult<Vec<Product>> {
    Ok(state.products().delete(id, confirmed).await?)
}
