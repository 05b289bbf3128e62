pub mod auth_token;
pub mod favorite;
pub mod follow;
pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod shopping_cart;
pub mod short_link;
pub mod tag;
pub mod user;

pub use auth_token::Entity as AuthTokenEntity;
pub use favorite::Entity as FavoriteEntity;
pub use follow::Entity as FollowEntity;
pub use ingredient::Entity as IngredientEntity;
pub use recipe::Entity as RecipeEntity;
pub use recipe_ingredient::Entity as RecipeIngredientEntity;
pub use recipe_tag::Entity as RecipeTagEntity;
pub use shopping_cart::Entity as ShoppingCartEntity;
pub use short_link::Entity as ShortLinkEntity;
pub use tag::Entity as TagEntity;
pub use user::Entity as UserEntity;
