/*
 * Responsibility
 * - repo 層の公開インターフェース
 */
pub mod drink_repo;
pub mod error;
