pub mod recipe_service;
pub mod relation_service;
pub mod shopping_list;
pub mod short_link;
pub mod user_service;

pub use recipe_service::{RecipeInput, RecipeService, RecipeView, RecipeWriteMode};
pub use relation_service::RelationService;
pub use shopping_list::{ShoppingLine, ShoppingListService};
pub use short_link::{CodeGenerator, RandomCodeGenerator, ShortLinkService, ShortLinkView};
pub use user_service::{RegisterInput, UserService};
